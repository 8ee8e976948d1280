use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;

/// A set of component types that can be matched against a [`World`].
///
/// Implemented for tuples of one to four [`Component`] types. An entity
/// matches when it holds every listed type.
pub trait Query {
    /// The values yielded for each matching entity.
    type Item: Clone;

    /// Collect every match, ordered by the first type's storage.
    fn fetch(world: &World) -> Vec<(EntityId, Self::Item)>;
}

macro_rules! impl_query {
    ($first:ident $(, $rest:ident)*) => {
        impl<$first: Component $(, $rest: Component)*> Query for ($first, $($rest,)*) {
            type Item = (Rc<$first>, $(Rc<$rest>,)*);

            #[allow(non_snake_case)]
            fn fetch(world: &World) -> Vec<(EntityId, Self::Item)> {
                world
                    .column::<$first>()
                    .filter_map(|(entity, $first)| {
                        $(let $rest = world.get::<$rest>(entity)?;)*
                        Some((entity, ($first, $($rest,)*)))
                    })
                    .collect()
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);

/// A query whose result is reused until the world's version changes.
///
/// Repeated reads against an unchanged world return the same shared slice;
/// [`CachedQuery::recomputations`] counts how often the result was rebuilt.
pub struct CachedQuery<Q: Query> {
    cached: Option<(u64, Rc<[(EntityId, Q::Item)]>)>,
    recomputations: u64,
    _query: PhantomData<fn() -> Q>,
}

impl<Q: Query> Default for CachedQuery<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: Query> fmt::Debug for CachedQuery<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedQuery")
            .field("version", &self.cached.as_ref().map(|(v, _)| *v))
            .field("recomputations", &self.recomputations)
            .finish()
    }
}

impl<Q: Query> CachedQuery<Q> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            cached: None,
            recomputations: 0,
            _query: PhantomData,
        }
    }

    /// The current result, rebuilt only if the world changed since the
    /// last call.
    pub fn get(&mut self, world: &World) -> Rc<[(EntityId, Q::Item)]> {
        let version = world.version();
        if let Some((_, result)) = self.cached.as_ref().filter(|(v, _)| *v == version) {
            return Rc::clone(result);
        }

        let result: Rc<[(EntityId, Q::Item)]> = Q::fetch(world).into();
        self.recomputations += 1;
        self.cached = Some((version, Rc::clone(&result)));
        result
    }

    /// Drop the cached result.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times the result has been computed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
