//! Ordered attacks on a single target.

use super::Task;
use crate::combat::attacker::{is_in_range, try_hit};
use crate::component::movement::{step_toward, StepResult};
use crate::component::Mobile;
use crate::entity::EntityId;
use crate::spatial::Spatial;
use crate::step::SimulationStep;
use crate::world::World;

/// Chase a target and hit it whenever the cooldown allows, until it dies.
#[derive(Debug)]
pub struct AttackTask {
    attacker: EntityId,
    target: EntityId,
    ended: bool,
}

impl AttackTask {
    pub fn new(attacker: EntityId, target: EntityId) -> Self {
        Self {
            attacker,
            target,
            ended: false,
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }
}

impl Task for AttackTask {
    fn entity(&self) -> EntityId {
        self.attacker
    }

    fn description(&self) -> String {
        format!("attack {}", self.target)
    }

    fn update(&mut self, world: &mut World, step: &SimulationStep) {
        if !world.is_alive(self.target) || !world.is_in_world(self.target) {
            self.ended = true;
            return;
        }
        if is_in_range(world, self.attacker, self.target) {
            try_hit(world, self.attacker, self.target);
            if !world.is_alive(self.target) {
                self.ended = true;
            }
            return;
        }
        if !world.has_component::<Mobile>(self.attacker) {
            self.ended = true;
            return;
        }
        let Some(destination) = world.component::<Spatial>(self.target).map(Spatial::center) else {
            self.ended = true;
            return;
        };
        if step_toward(world, self.attacker, destination, step) == StepResult::Stuck {
            self.ended = true;
        }
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}
