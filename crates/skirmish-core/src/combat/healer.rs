use serde::{Deserialize, Serialize};

use super::{Constitution, Health};
use crate::component::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::entity::EntityId;
use crate::event::SimEvent;
use crate::spatial::{Circle, Spatial};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::task::TaskQueue;
use crate::world::World;

/// Mends damaged allied biological units nearby while otherwise idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Healer {
    /// Hit points restored per second.
    speed: f32,
    range: f32,
}

impl Healer {
    pub const SPEED: Stat = Stat::real(ComponentKind::Healer, "Speed");
    pub const RANGE: Stat = Stat::real(ComponentKind::Healer, "Range");

    pub fn new(speed: f32, range: f32) -> Self {
        Self { speed, range }
    }
}

impl ComponentData for Healer {
    const KIND: ComponentKind = ComponentKind::Healer;
    const STATS: &'static [Stat] = &[Self::SPEED, Self::RANGE];
    const PROPERTIES: &'static [Property] =
        &[Property::mandatory("speed"), Property::mandatory("range")];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::SPEED => Some(StatValue::Real(self.speed)),
            Self::RANGE => Some(StatValue::Real(self.range)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.speed >= 0.0 && self.range >= 0.0) {
            return Err("speed and range must be non-negative".to_owned());
        }
        Ok(())
    }

    impl_downcast!(Healer);
}

/// The nearest damaged, allied, biological entity within healing range.
/// Ties go to the lower id.
pub fn find_patient(world: &World, healer: EntityId) -> Option<EntityId> {
    let center = world.component::<Spatial>(healer)?.center();
    let range = world.stat_f32(healer, Healer::RANGE)?;
    let mut best: Option<(f32, EntityId)> = None;
    for candidate in world.spatial().intersecting(&Circle::new(center, range)) {
        if candidate == healer || !world.is_allied(healer, candidate) {
            continue;
        }
        let needs_care = world.component::<Health>(candidate).is_some_and(|health| {
            health.constitution() == Constitution::Biological && health.is_damaged()
        });
        if !needs_care {
            continue;
        }
        let Some(region) = world.spatial().region_of(candidate) else {
            continue;
        };
        let distance = region.squared_distance_to_point(center);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, id)| id)
}

/// Heal one patient per tick while the healer has no queued task.
pub(crate) fn update(world: &mut World, entity: EntityId, step: &SimulationStep) {
    let busy = world
        .component::<TaskQueue>(entity)
        .is_some_and(|queue| !queue.is_empty());
    if busy {
        return;
    }
    let Some(patient) = find_patient(world, entity) else {
        return;
    };
    let Some(speed) = world.stat_f32(entity, Healer::SPEED) else {
        return;
    };
    let amount = world.heal(patient, speed * step.time_delta);
    if amount > 0.0 {
        world.push_event(SimEvent::Healed {
            healer: entity,
            target: patient,
            amount,
        });
    }
}
