//! Point-to-point movement orders.

use glam::Vec2;

use super::Task;
use crate::component::movement::{step_toward, StepResult};
use crate::entity::EntityId;
use crate::step::SimulationStep;
use crate::world::World;

/// Walk in a straight line until the entity's center reaches a point.
#[derive(Debug)]
pub struct MoveTask {
    entity: EntityId,
    destination: Vec2,
    ended: bool,
}

impl MoveTask {
    pub fn new(entity: EntityId, destination: Vec2) -> Self {
        Self {
            entity,
            destination,
            ended: false,
        }
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }
}

impl Task for MoveTask {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn description(&self) -> String {
        format!("move to ({:.1}, {:.1})", self.destination.x, self.destination.y)
    }

    fn update(&mut self, world: &mut World, step: &SimulationStep) {
        match step_toward(world, self.entity, self.destination, step) {
            StepResult::Moving => {}
            StepResult::Arrived | StepResult::Stuck => self.ended = true,
        }
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}
