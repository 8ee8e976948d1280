use crate::entity::EntityId;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when mutating a world.
///
/// These are integrity errors: they signal a caller holding a stale or
/// foreign entity id, not bad user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The entity does not exist (never spawned, or already despawned).
    #[error("entity {0} does not exist in this world")]
    EntityNotFound(EntityId),
}
