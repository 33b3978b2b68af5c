//! Movement and vision components.
//!
//! Movement is straight-line: a mobile entity advances its center toward a
//! destination by `Speed * dt` each tick. Path planning around obstacles is
//! the job of an external planner feeding [`MoveTask`](crate::task::movement::MoveTask)
//! waypoints.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::entity::EntityId;
use crate::spatial::Spatial;
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::world::World;

// ---------------------------------------------------------------------------
// Mobile
// ---------------------------------------------------------------------------

/// Lets an entity move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mobile {
    speed: f32,
}

impl Mobile {
    /// World units per second.
    pub const SPEED: Stat = Stat::real(ComponentKind::Mobile, "Speed");

    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl ComponentData for Mobile {
    const KIND: ComponentKind = ComponentKind::Mobile;
    const STATS: &'static [Stat] = &[Self::SPEED];
    const PROPERTIES: &'static [Property] = &[Property::mandatory("speed")];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::SPEED => Some(StatValue::Real(self.speed)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.speed >= 0.0 && self.speed.is_finite()) {
            return Err(format!("speed must be non-negative, got {}", self.speed));
        }
        Ok(())
    }

    impl_downcast!(Mobile);
}

/// Outcome of one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The entity's center reached the destination.
    Arrived,
    /// The entity moved but has not arrived yet.
    Moving,
    /// The entity cannot move (no `Mobile`, no `Spatial`, or zero speed).
    Stuck,
}

/// Advance `entity`'s center toward `destination` by one tick of movement.
pub fn step_toward(
    world: &mut World,
    entity: EntityId,
    destination: Vec2,
    step: &SimulationStep,
) -> StepResult {
    let Some(spatial) = world.component::<Spatial>(entity) else {
        return StepResult::Stuck;
    };
    let center = spatial.center();
    let offset = destination - center;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return StepResult::Arrived;
    }

    let Some(speed) = world.stat_f32(entity, Mobile::SPEED) else {
        return StepResult::Stuck;
    };
    let max_travel = speed * step.time_delta;
    if max_travel <= 0.0 {
        return StepResult::Stuck;
    }

    let position = spatial.position();
    if max_travel >= distance {
        world.set_position(entity, position + offset);
        StepResult::Arrived
    } else {
        world.set_position(entity, position + offset / distance * max_travel);
        StepResult::Moving
    }
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

/// Sight radius around an entity's center, used for target acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vision {
    range: f32,
}

impl Vision {
    pub const RANGE: Stat = Stat::real(ComponentKind::Vision, "Range");

    pub fn new(range: f32) -> Self {
        Self { range }
    }
}

impl ComponentData for Vision {
    const KIND: ComponentKind = ComponentKind::Vision;
    const STATS: &'static [Stat] = &[Self::RANGE];
    const PROPERTIES: &'static [Property] = &[Property::mandatory("range")];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::RANGE => Some(StatValue::Real(self.range)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.range >= 0.0 && self.range.is_finite()) {
            return Err(format!("vision range must be non-negative, got {}", self.range));
        }
        Ok(())
    }

    impl_downcast!(Vision);
}
