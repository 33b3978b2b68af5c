//! Construction sites, builders, and the build/repair task.

use serde::{Deserialize, Serialize};

use super::{advance, Production, ProductionState};
use crate::combat::{Constitution, Health};
use crate::component::movement::{step_toward, StepResult};
use crate::component::{
    impl_downcast, Component, ComponentData, ComponentKind, Cost, Mobile, Property,
};
use crate::entity::EntityId;
use crate::event::SimEvent;
use crate::spatial::{Region, Spatial};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::task::Task;
use crate::world::World;

// ---------------------------------------------------------------------------
// BuildProgress
// ---------------------------------------------------------------------------

/// Marks a building under construction.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildProgress {
    #[serde(flatten)]
    state: ProductionState,
}

impl BuildProgress {
    pub fn new(required_time: f32, hidden: Vec<Component>) -> Self {
        Self {
            state: ProductionState::new(required_time, hidden),
        }
    }

    pub fn progress(&self) -> f32 {
        self.state.progress()
    }
}

impl Production for BuildProgress {
    fn state(&self) -> &ProductionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProductionState {
        &mut self.state
    }

    fn into_state(component: Component) -> Option<ProductionState> {
        match component {
            Component::BuildProgress(progress) => Some(progress.state),
            _ => None,
        }
    }
}

impl ComponentData for BuildProgress {
    const KIND: ComponentKind = ComponentKind::BuildProgress;
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("required_time"),
        Property::persistent("elapsed"),
        Property::persistent("hidden"),
        Property::transient("progress"),
    ];

    fn validate(&self) -> Result<(), String> {
        self.state.validate()
    }

    impl_downcast!(BuildProgress);
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Lets a unit construct and repair buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Builder {
    /// Seconds of construction work per second.
    speed: f32,
}

impl Builder {
    pub const SPEED: Stat = Stat::real(ComponentKind::Builder, "Speed");

    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl ComponentData for Builder {
    const KIND: ComponentKind = ComponentKind::Builder;
    const STATS: &'static [Stat] = &[Self::SPEED];
    const PROPERTIES: &'static [Property] = &[Property::mandatory("speed")];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::SPEED => Some(StatValue::Real(self.speed)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(format!("builder speed must be positive, got {}", self.speed));
        }
        Ok(())
    }

    impl_downcast!(Builder);
}

// ---------------------------------------------------------------------------
// BuildTask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Work {
    Construct,
    Repair,
}

/// Walk up to an allied building, then construct it or, once it stands,
/// repair it if it is mechanical and damaged.
#[derive(Debug)]
pub struct BuildTask {
    builder: EntityId,
    site: EntityId,
    ended: bool,
}

impl BuildTask {
    pub fn new(builder: EntityId, site: EntityId) -> Self {
        Self {
            builder,
            site,
            ended: false,
        }
    }

    pub fn site(&self) -> EntityId {
        self.site
    }

    fn work_needed(&self, world: &World) -> Option<Work> {
        if world.has_component::<BuildProgress>(self.site) {
            return Some(Work::Construct);
        }
        let health = world.component::<Health>(self.site)?;
        (health.constitution() == Constitution::Mechanical && health.is_damaged())
            .then_some(Work::Repair)
    }

    fn is_adjacent(&self, world: &World) -> bool {
        match (
            world.spatial().region_of(self.builder),
            world.spatial().region_of(self.site),
        ) {
            (Some(a), Some(b)) => Region::are_adjacent_or_intersecting(&a, &b),
            _ => false,
        }
    }
}

impl Task for BuildTask {
    fn entity(&self) -> EntityId {
        self.builder
    }

    fn description(&self) -> String {
        format!("build {}", self.site)
    }

    fn update(&mut self, world: &mut World, step: &SimulationStep) {
        if !world.is_in_world(self.site) || !world.is_allied(self.builder, self.site) {
            self.ended = true;
            return;
        }
        let Some(work) = self.work_needed(world) else {
            self.ended = true;
            return;
        };

        if !self.is_adjacent(world) {
            let destination = world.component::<Spatial>(self.site).map(Spatial::center);
            let moved = match destination {
                Some(destination) if world.has_component::<Mobile>(self.builder) => {
                    step_toward(world, self.builder, destination, step)
                }
                _ => StepResult::Stuck,
            };
            if moved == StepResult::Stuck {
                self.ended = true;
            }
            return;
        }

        let Some(speed) = world.stat_f32(self.builder, Builder::SPEED) else {
            self.ended = true;
            return;
        };
        let effort = speed * step.time_delta;
        match work {
            Work::Construct => {
                if advance::<BuildProgress>(world, self.site, effort) == Some(true) {
                    tracing::debug!(site = %self.site, builder = %self.builder, "construction completed");
                    world.push_event(SimEvent::ConstructionCompleted { entity: self.site });
                    self.ended = true;
                }
            }
            Work::Repair => {
                // A full repair takes as long as the original construction.
                let rate = match (
                    world.stat_f32(self.site, Health::MAX_HEALTH),
                    world.stat_f32(self.site, Cost::PRODUCTION_TIME),
                ) {
                    (Some(max), Some(time)) if time > 0.0 => max / time,
                    _ => {
                        self.ended = true;
                        return;
                    }
                };
                world.heal(self.site, rate * effort);
                if self.work_needed(world).is_none() {
                    self.ended = true;
                }
            }
        }
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}
