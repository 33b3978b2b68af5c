//! Attacks: target acquisition, range checks, cooldown, and splash.
//!
//! An attacker with `Range <= 0` is melee: it must stand adjacent to (or
//! overlapping) its target. Ranged attackers hit anything whose footprint
//! meets the circle of radius `Range` around their center.

use serde::{Deserialize, Serialize};

use super::{compute_damage, splash_falloff, ArmorType, DamageModifier, Health};
use crate::component::{impl_downcast, ComponentData, ComponentKind, Property, Vision};
use crate::entity::EntityId;
use crate::event::SimEvent;
use crate::spatial::{Circle, CollisionLayer, Region, Shape, Spatial};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::task::{AttackTask, TaskQueue};
use crate::world::World;

fn cooldown_ready() -> f32 {
    f32::MAX
}

/// Lets an entity damage others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attacker {
    power: i32,
    #[serde(default)]
    range: f32,
    /// Seconds between two hits.
    delay: f32,
    #[serde(default)]
    splash_radius: f32,
    #[serde(default)]
    super_effective: Vec<ArmorType>,
    #[serde(default)]
    ineffective: Vec<ArmorType>,
    /// Seconds since the last hit. Starts ready.
    #[serde(default = "cooldown_ready")]
    time_since_last_hit: f32,
}

impl Attacker {
    pub const POWER: Stat = Stat::integer(ComponentKind::Attacker, "Power");
    pub const RANGE: Stat = Stat::real(ComponentKind::Attacker, "Range");
    pub const DELAY: Stat = Stat::real(ComponentKind::Attacker, "Delay");
    pub const SPLASH_RADIUS: Stat = Stat::real(ComponentKind::Attacker, "SplashRadius");

    pub fn new(power: i32, range: f32, delay: f32) -> Self {
        Self {
            power,
            range,
            delay,
            splash_radius: 0.0,
            super_effective: Vec::new(),
            ineffective: Vec::new(),
            time_since_last_hit: cooldown_ready(),
        }
    }

    pub fn with_splash(mut self, radius: f32) -> Self {
        self.splash_radius = radius;
        self
    }

    pub fn super_effective_against(mut self, armor: ArmorType) -> Self {
        self.super_effective.push(armor);
        self
    }

    pub fn ineffective_against(mut self, armor: ArmorType) -> Self {
        self.ineffective.push(armor);
        self
    }

    /// How this attacker's power is adjusted against `armor`. Super
    /// effectiveness wins if a type is listed in both sets.
    pub fn modifier_against(&self, armor: ArmorType) -> DamageModifier {
        if self.super_effective.contains(&armor) {
            DamageModifier::SuperEffective
        } else if self.ineffective.contains(&armor) {
            DamageModifier::Ineffective
        } else {
            DamageModifier::Normal
        }
    }

    pub fn time_since_last_hit(&self) -> f32 {
        self.time_since_last_hit
    }
}

impl ComponentData for Attacker {
    const KIND: ComponentKind = ComponentKind::Attacker;
    const STATS: &'static [Stat] = &[Self::POWER, Self::RANGE, Self::DELAY, Self::SPLASH_RADIUS];
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("power"),
        Property::persistent("range"),
        Property::mandatory("delay"),
        Property::persistent("splash_radius"),
        Property::persistent("super_effective"),
        Property::persistent("ineffective"),
        Property::persistent("time_since_last_hit"),
    ];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::POWER => Some(StatValue::Integer(self.power)),
            Self::RANGE => Some(StatValue::Real(self.range)),
            Self::DELAY => Some(StatValue::Real(self.delay)),
            Self::SPLASH_RADIUS => Some(StatValue::Real(self.splash_radius)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.power < 0 {
            return Err(format!("power must not be negative, got {}", self.power));
        }
        for (name, value) in [
            ("range", self.range),
            ("delay", self.delay),
            ("splash_radius", self.splash_radius),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(format!("{name} must be non-negative and finite, got {value}"));
            }
        }
        Ok(())
    }

    impl_downcast!(Attacker);
}

// ---------------------------------------------------------------------------
// Targeting
// ---------------------------------------------------------------------------

fn is_melee(world: &World, attacker: EntityId) -> bool {
    world
        .stat_f32(attacker, Attacker::RANGE)
        .map_or(true, |range| range <= 0.0)
}

/// Layer rule: ranged attackers hit anything; melee attackers reach air
/// units only when airborne themselves.
fn can_reach_layer(melee: bool, own: CollisionLayer, target: CollisionLayer) -> bool {
    !melee || target != CollisionLayer::Air || own == CollisionLayer::Air
}

/// Whether `attacker` may pick `target`: an enemy with health on a
/// reachable layer.
pub fn is_valid_target(world: &World, attacker: EntityId, target: EntityId) -> bool {
    if attacker == target || !world.has_component::<Health>(target) {
        return false;
    }
    if !world.is_enemy(attacker, target) {
        return false;
    }
    let (Some(own), Some(other)) = (
        world.component::<Spatial>(attacker),
        world.component::<Spatial>(target),
    ) else {
        return false;
    };
    can_reach_layer(
        is_melee(world, attacker),
        own.collision_layer(),
        other.collision_layer(),
    )
}

/// First valid target, in id order, inside the attacker's vision circle.
pub fn find_visible_target(world: &World, attacker: EntityId) -> Option<EntityId> {
    let center = world.component::<Spatial>(attacker)?.center();
    let range = world.stat_f32(attacker, Vision::RANGE)?;
    world
        .spatial()
        .intersecting(&Circle::new(center, range))
        .into_iter()
        .find(|&candidate| is_valid_target(world, attacker, candidate))
}

/// Whether `target` is within reach of `attacker` right now.
pub fn is_in_range(world: &World, attacker: EntityId, target: EntityId) -> bool {
    let (Some(own), Some(other)) = (
        world.component::<Spatial>(attacker),
        world.component::<Spatial>(target),
    ) else {
        return false;
    };
    let target_region = other.grid_region();
    if is_melee(world, attacker) {
        return Region::are_adjacent_or_intersecting(&own.grid_region(), &target_region);
    }
    let Some(range) = world.stat_f32(attacker, Attacker::RANGE) else {
        return false;
    };
    Circle::new(own.center(), range).intersects_region(&target_region)
}

// ---------------------------------------------------------------------------
// Hitting
// ---------------------------------------------------------------------------

/// Hit `target` if the cooldown has elapsed. Returns whether a hit landed.
pub fn try_hit(world: &mut World, attacker: EntityId, target: EntityId) -> bool {
    let Some(delay) = world.stat_f32(attacker, Attacker::DELAY) else {
        return false;
    };
    let ready = world
        .component::<Attacker>(attacker)
        .is_some_and(|a| a.time_since_last_hit >= delay);
    if !ready || !world.is_alive(target) {
        return false;
    }
    hit(world, attacker, target);
    true
}

/// Damage `attacker` would deal to `target` in one direct hit.
pub fn damage_against(world: &World, attacker: EntityId, target: EntityId) -> Option<i32> {
    let power = world.stat_i32(attacker, Attacker::POWER)?;
    let armor = world.stat_i32(target, Health::ARMOR)?;
    let armor_type = world.component::<Health>(target)?.armor_type();
    let modifier = world.component::<Attacker>(attacker)?.modifier_against(armor_type);
    Some(compute_damage(power, armor, modifier))
}

/// Hit `target` unconditionally, then splash its surroundings.
///
/// Resets the cooldown. Splash victims are every other non-allied entity
/// with health whose footprint meets the splash circle around the target;
/// each takes its own computed damage scaled by [`splash_falloff`].
pub fn hit(world: &mut World, attacker: EntityId, target: EntityId) {
    if let Some(component) = world.component_mut::<Attacker>(attacker) {
        component.time_since_last_hit = 0.0;
    }
    let Some(damage) = damage_against(world, attacker, target) else {
        return;
    };
    let splash = world
        .stat_f32(attacker, Attacker::SPLASH_RADIUS)
        .filter(|&radius| radius > 0.0)
        .and_then(|radius| {
            let center = world.component::<Spatial>(target)?.center();
            Some(Circle::new(center, radius))
        });

    world.push_event(SimEvent::Hit {
        attacker,
        target,
        damage: damage as f32,
    });
    world.apply_damage(target, damage as f32);

    let Some(circle) = splash else {
        return;
    };
    for victim in world.spatial().intersecting(&circle) {
        if victim == target || victim == attacker || !world.is_alive(victim) {
            continue;
        }
        if world.is_allied(attacker, victim) || !world.has_component::<Health>(victim) {
            continue;
        }
        let Some(region) = world.spatial().region_of(victim) else {
            continue;
        };
        let falloff = splash_falloff(region.distance_to_point(circle.center), circle.radius);
        let amount = damage_against(world, attacker, victim).unwrap_or(0) as f32 * falloff;
        if amount > 0.0 {
            world.push_event(SimEvent::Hit {
                attacker,
                target: victim,
                damage: amount,
            });
            world.apply_damage(victim, amount);
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Advance the cooldown; an idle attacker engages the first visible enemy.
pub(crate) fn update(world: &mut World, entity: EntityId, step: &SimulationStep) {
    let Some(component) = world.component_mut::<Attacker>(entity) else {
        return;
    };
    if component.time_since_last_hit < f32::MAX {
        component.time_since_last_hit += step.time_delta;
    }

    let idle = world
        .component::<TaskQueue>(entity)
        .is_some_and(TaskQueue::is_empty);
    if !idle {
        return;
    }
    if let Some(target) = find_visible_target(world, entity) {
        let task = AttackTask::new(entity, target);
        if let Err(error) = world.enqueue_task(entity, Box::new(task)) {
            tracing::debug!(%entity, %error, "auto-attack not queued");
        }
    }
}
