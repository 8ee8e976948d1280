use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an entity in a [`World`](crate::World).
///
/// Ids are allocated sequentially starting at 1 and are never reused within
/// one world, so a stale id can only ever miss, never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn entity_ids_order_numerically() {
        assert!(EntityId(2) < EntityId(10));
    }
}
