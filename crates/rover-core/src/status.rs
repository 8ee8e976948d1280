use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::Status;
use crate::entity::EntityId;
use crate::error::StoreResult;
use crate::world::World;

/// Operating state of a bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// Powered and waiting for commands.
    #[default]
    Idle,
    /// Executing a motion.
    Moving,
    /// Faulted; only [`StatusTrigger::BatteryRestored`] or
    /// [`StatusTrigger::Reset`] leave this state.
    Error,
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Moving => write!(f, "moving"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Something that happened to a bot which may change its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTrigger {
    /// A motion animation began.
    MotionStarted,
    /// A motion animation reached its destination.
    MotionFinished,
    /// Battery dropped below the low threshold.
    BatteryLow,
    /// Battery dropped below the critical threshold.
    BatteryCritical,
    /// Battery is back above the low threshold.
    BatteryRestored,
    /// A command failed on this bot.
    Fault,
    /// Operator reset.
    Reset,
}

impl EntityStatus {
    /// The state reached from `self` when `trigger` fires.
    ///
    /// Total over all pairs; an unchanged result means the trigger is
    /// ignored in this state.
    pub fn transition(self, trigger: StatusTrigger) -> Self {
        use EntityStatus::*;
        use StatusTrigger::*;

        match (self, trigger) {
            (_, BatteryCritical) | (_, Fault) => Error,
            (_, Reset) => Idle,
            (Error, BatteryRestored) => Idle,
            (Error, _) => Error,
            (_, MotionStarted) => Moving,
            (_, MotionFinished) => Idle,
            (state, BatteryLow | BatteryRestored) => state,
        }
    }
}

/// Feed `trigger` to an entity's [`Status`] component.
///
/// The component is only rewritten when the state actually changes.
/// Returns the resulting state, or `None` when the entity has no status.
pub fn apply_trigger(
    world: &mut World,
    entity: EntityId,
    trigger: StatusTrigger,
) -> StoreResult<Option<EntityStatus>> {
    let Some(current) = world.get::<Status>(entity) else {
        return Ok(None);
    };
    let next = current.state.transition(trigger);
    if next != current.state {
        tracing::debug!(entity = %entity, from = %current.state, to = %next, ?trigger, "status transition");
        world.insert(entity, Status::new(next))?;
    }
    Ok(Some(next))
}
