//! Training units inside a trainer building.
//!
//! The trainee exists from the start of training as an inactive entity, so
//! its food is reserved for the whole duration. The [`TrainTask`] owns it: if
//! the task is cancelled or the trainer dies, the trainee is removed.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::{advance, Production, ProductionState};
use crate::component::{impl_downcast, Component, ComponentData, ComponentKind, Property};
use crate::entity::EntityId;
use crate::event::{SimEvent, Warning};
use crate::spatial::{Region, Spatial};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::task::Task;
use crate::world::World;

// ---------------------------------------------------------------------------
// TrainProgress
// ---------------------------------------------------------------------------

/// Marks a unit still being trained.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainProgress {
    #[serde(flatten)]
    state: ProductionState,
    trainer: EntityId,
}

impl TrainProgress {
    pub fn new(required_time: f32, hidden: Vec<Component>, trainer: EntityId) -> Self {
        Self {
            state: ProductionState::new(required_time, hidden),
            trainer,
        }
    }

    pub fn trainer(&self) -> EntityId {
        self.trainer
    }

    pub fn progress(&self) -> f32 {
        self.state.progress()
    }
}

impl Production for TrainProgress {
    fn state(&self) -> &ProductionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProductionState {
        &mut self.state
    }

    fn into_state(component: Component) -> Option<ProductionState> {
        match component {
            Component::TrainProgress(progress) => Some(progress.state),
            _ => None,
        }
    }
}

impl ComponentData for TrainProgress {
    const KIND: ComponentKind = ComponentKind::TrainProgress;
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("required_time"),
        Property::persistent("elapsed"),
        Property::persistent("hidden"),
        Property::mandatory("trainer"),
        Property::transient("progress"),
    ];

    fn validate(&self) -> Result<(), String> {
        self.state.validate()
    }

    impl_downcast!(TrainProgress);
}

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

/// Lets a building train units from a fixed catalog of prototypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    /// Seconds of training work per second.
    speed: f32,
    trainable: Vec<String>,
}

impl Trainer {
    pub const SPEED: Stat = Stat::real(ComponentKind::Trainer, "Speed");

    pub fn new<I, S>(speed: f32, trainable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            speed,
            trainable: trainable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn can_train(&self, prototype: &str) -> bool {
        self.trainable.iter().any(|name| name == prototype)
    }

    pub fn trainable(&self) -> &[String] {
        &self.trainable
    }
}

impl ComponentData for Trainer {
    const KIND: ComponentKind = ComponentKind::Trainer;
    const STATS: &'static [Stat] = &[Self::SPEED];
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("speed"),
        Property::mandatory("trainable"),
    ];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::SPEED => Some(StatValue::Real(self.speed)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(format!("trainer speed must be positive, got {}", self.speed));
        }
        Ok(())
    }

    impl_downcast!(Trainer);
}

// ---------------------------------------------------------------------------
// Disembarking
// ---------------------------------------------------------------------------

/// First free spot, in row order, where a footprint of `size` on the
/// trainee's layer touches the trainer without overlapping it.
pub fn find_disembark_position(world: &World, trainer: EntityId, trainee: EntityId) -> Option<Vec2> {
    let around = world.component::<Spatial>(trainer)?.grid_region();
    let unit = world.component::<Spatial>(trainee)?;
    let (size, layer) = (unit.size(), unit.collision_layer());

    let lo = around.min() - size;
    let hi = around.max();
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            let spot = Region::new(IVec2::new(x, y), size);
            if spot.intersects(&around) || !Region::are_adjacent_or_intersecting(&around, &spot) {
                continue;
            }
            if world.spatial().is_free(&spot, layer) {
                return Some(spot.min().as_vec2());
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// TrainTask
// ---------------------------------------------------------------------------

/// Train one unit of a prototype and release it next to the trainer.
#[derive(Debug)]
pub struct TrainTask {
    trainer: EntityId,
    prototype: String,
    trainee: Option<EntityId>,
    /// A `NoDisembarkTile` warning was already raised for the current
    /// blockage.
    blocked: bool,
    ended: bool,
}

impl TrainTask {
    pub fn new(trainer: EntityId, prototype: impl Into<String>) -> Self {
        Self {
            trainer,
            prototype: prototype.into(),
            trainee: None,
            blocked: false,
            ended: false,
        }
    }

    pub fn prototype(&self) -> &str {
        &self.prototype
    }

    /// The unit under training, once started.
    pub fn trainee(&self) -> Option<EntityId> {
        self.trainee
    }

    fn disembark(&mut self, world: &mut World, trainee: EntityId) {
        let Some(position) = find_disembark_position(world, self.trainer, trainee) else {
            if !self.blocked {
                tracing::debug!(trainer = %self.trainer, %trainee, "no free tile to disembark");
                world.push_event(SimEvent::Warning {
                    entity: self.trainer,
                    warning: Warning::NoDisembarkTile,
                });
                self.blocked = true;
            }
            return;
        };
        world.set_position(trainee, position);
        world.activate(trainee);
        tracing::debug!(trainer = %self.trainer, unit = %trainee, "training completed");
        world.push_event(SimEvent::TrainingCompleted {
            trainer: self.trainer,
            unit: trainee,
        });
        self.trainee = None;
        self.ended = true;
    }
}

impl Task for TrainTask {
    fn entity(&self) -> EntityId {
        self.trainer
    }

    fn description(&self) -> String {
        format!("train {}", self.prototype)
    }

    fn update(&mut self, world: &mut World, step: &SimulationStep) {
        let trainee = match self.trainee {
            Some(trainee) => trainee,
            None => match world.create_trainee(&self.prototype, self.trainer) {
                Ok(trainee) => {
                    self.trainee = Some(trainee);
                    trainee
                }
                Err(error) => {
                    tracing::warn!(trainer = %self.trainer, %error, "training could not start");
                    self.ended = true;
                    return;
                }
            },
        };

        if world.has_component::<TrainProgress>(trainee) {
            let Some(speed) = world.stat_f32(self.trainer, Trainer::SPEED) else {
                return;
            };
            if advance::<TrainProgress>(world, trainee, speed * step.time_delta) != Some(true) {
                return;
            }
        }
        self.disembark(world, trainee);
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn dispose(&mut self, world: &mut World) {
        if let Some(trainee) = self.trainee.take() {
            if world.is_alive(trainee) {
                tracing::debug!(trainer = %self.trainer, %trainee, "training abandoned");
                world.remove_entity(trainee);
            }
        }
    }
}
