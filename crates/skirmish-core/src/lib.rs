//! Skirmish core -- deterministic simulation of a real-time strategy match.
//!
//! The world holds entities, each composed of at most one component per
//! [`ComponentKind`](component::ComponentKind). Components own numeric
//! [`Stat`](stat::Stat)s whose final values include bonuses from every other
//! component on the entity (faction technology, for instance). A uniform
//! grid [`SpatialManager`](spatial::SpatialManager) answers region and circle
//! queries. Units act through per-entity [`TaskQueue`](task::TaskQueue)s
//! whose entries are addressed by stable [`TaskHandle`](task::TaskHandle)s.
//!
//! Given the same initial state and the same sequence of commands and step
//! durations, the simulation produces bit-identical results.
//!
//! # Quick Start
//!
//! ```
//! use skirmish_core::prelude::*;
//! use glam::{IVec2, Vec2};
//!
//! let mut world = World::new(WorldConfig::default());
//! let unit = world.create_entity(vec![
//!     Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
//!     Mobile::new(2.0).into(),
//!     TaskQueue::new().into(),
//! ]);
//! world.activate(unit);
//!
//! world
//!     .enqueue_task(unit, Box::new(MoveTask::new(unit, Vec2::new(4.5, 0.5))))
//!     .unwrap();
//! world.update(&SimulationStep::new(0, 0.0, 1.0));
//!
//! let position = world.component::<Spatial>(unit).unwrap().position();
//! assert_eq!(position, Vec2::new(2.0, 0.0));
//! ```

#![deny(unsafe_code)]

pub mod combat;
pub mod component;
pub mod entity;
pub mod event;
pub mod faction;
pub mod production;
pub mod prototype;
pub mod snapshot;
pub mod spatial;
pub mod stat;
pub mod step;
pub mod task;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by simulation operations.
///
/// Misuse that can only come from a bug in the calling code (mutating a
/// removed entity, mixing stat kinds) panics instead.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The entity does not exist (removed, or never allocated).
    #[error("entity {entity} does not exist (removed or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// An operation needed a component the entity does not carry.
    #[error("entity {entity} has no {kind} component")]
    MissingComponent {
        entity: entity::EntityId,
        kind: component::ComponentKind,
    },

    /// No prototype with this name is registered.
    #[error("unknown prototype '{name}'")]
    UnknownPrototype { name: String },

    /// A prototype definition could not be parsed or is structurally wrong.
    #[error("malformed prototype '{name}': {details}")]
    MalformedPrototype { name: String, details: String },

    /// A component's values are out of range.
    #[error("invalid {kind} component: {details}")]
    InvalidComponent {
        kind: component::ComponentKind,
        details: String,
    },

    /// The faction id is not registered.
    #[error("unknown faction {faction}")]
    UnknownFaction { faction: faction::FactionId },

    /// No queued task has this handle.
    #[error("entity {entity} has no task with handle {handle}")]
    UnknownTaskHandle {
        entity: entity::EntityId,
        handle: task::TaskHandle,
    },

    /// The trainer cannot produce the requested prototype.
    #[error("entity {trainer} cannot train '{prototype}'")]
    NotTrainable {
        trainer: entity::EntityId,
        prototype: String,
    },

    /// A snapshot is inconsistent or does not deserialize.
    #[error("malformed snapshot: {details}")]
    MalformedSnapshot { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::combat::{
        ArmorType, Attacker, Constitution, DamageModifier, Healer, Health, Kamikaze,
    };
    pub use crate::component::{Component, ComponentData, ComponentKind, Cost, Identity, Mobile, Vision};
    pub use crate::entity::{Entity, EntityId, EntityState};
    pub use crate::event::{SimEvent, Warning};
    pub use crate::faction::{
        BasicFaction, DiplomaticStance, Faction, FactionId, FactionMembership, FactionRegistry,
    };
    pub use crate::production::{BuildProgress, BuildTask, Builder, TrainProgress, TrainTask, Trainer};
    pub use crate::prototype::PrototypeRegistry;
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::spatial::{Circle, CollisionLayer, Region, Shape, Spatial, SpatialManager};
    pub use crate::stat::{Stat, StatValue};
    pub use crate::step::SimulationStep;
    pub use crate::task::{AttackTask, MoveTask, Task, TaskHandle, TaskQueue};
    pub use crate::world::{World, WorldConfig};
    pub use crate::SimError;
}
