//! Notifications emitted by the simulation.
//!
//! The world appends events to a queue while it runs; presentation and
//! network layers drain it after each tick. Nothing in the core waits on a
//! consumer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::spatial::Circle;

/// Non-fatal conditions surfaced to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// A trained unit is ready but every tile around its trainer is taken.
    NoDisembarkTile,
}

/// Something observable happened in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    EntityAdded { entity: EntityId },
    EntityRemoved { entity: EntityId },
    /// Health reached zero. Followed by `EntityRemoved`.
    Died { entity: EntityId },
    Moved { entity: EntityId, position: Vec2 },
    /// The set of queued tasks of `entity` changed.
    TaskQueueChanged { entity: EntityId },
    Hit {
        attacker: EntityId,
        target: EntityId,
        damage: f32,
    },
    ExplosionOccurred { source: EntityId, circle: Circle },
    Healed { healer: EntityId, target: EntityId, amount: f32 },
    ConstructionCompleted { entity: EntityId },
    TrainingCompleted { trainer: EntityId, unit: EntityId },
    Warning { entity: EntityId, warning: Warning },
}
