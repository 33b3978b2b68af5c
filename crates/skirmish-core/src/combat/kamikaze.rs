//! Kamikaze units and chained explosions.
//!
//! A kamikaze touching one of its target prototypes destroys it and blows
//! up. Other kamikaze units caught in a blast detonate in turn. The chain is
//! processed with an explicit worklist:
//!
//! - each entity explodes at most once per chain;
//! - a detonating entity is removed from the world before its blast is
//!   applied, so it can never be hit by its own or a later blast;
//! - every other entity takes blast damage at most once per chain, from the
//!   first blast that reaches it.
//!
//! Kamikaze units caught in a blast are queued to detonate instead of being
//! damaged.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{explosion_falloff, Health};
use crate::component::{impl_downcast, ComponentData, ComponentKind, Identity, Property};
use crate::entity::EntityId;
use crate::event::SimEvent;
use crate::spatial::{Circle, Region, Spatial};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::world::World;

/// Explodes on contact with specific prototypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kamikaze {
    damage: f32,
    radius: f32,
    /// Prototype names that trigger the explosion.
    targets: BTreeSet<String>,
    #[serde(skip)]
    exploding: bool,
}

impl Kamikaze {
    pub const DAMAGE: Stat = Stat::real(ComponentKind::Kamikaze, "Damage");
    pub const RADIUS: Stat = Stat::real(ComponentKind::Kamikaze, "Radius");

    pub fn new<I, S>(damage: f32, radius: f32, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            damage,
            radius,
            targets: targets.into_iter().map(Into::into).collect(),
            exploding: false,
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    pub fn is_target(&self, prototype: &str) -> bool {
        self.targets.contains(prototype)
    }

    pub fn is_exploding(&self) -> bool {
        self.exploding
    }
}

impl ComponentData for Kamikaze {
    const KIND: ComponentKind = ComponentKind::Kamikaze;
    const STATS: &'static [Stat] = &[Self::DAMAGE, Self::RADIUS];
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("damage"),
        Property::mandatory("radius"),
        Property::mandatory("targets"),
        Property::transient("exploding"),
    ];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::DAMAGE => Some(StatValue::Real(self.damage)),
            Self::RADIUS => Some(StatValue::Real(self.radius)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.damage >= 0.0 && self.damage.is_finite()) {
            return Err(format!("damage must be non-negative, got {}", self.damage));
        }
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(format!("radius must be positive, got {}", self.radius));
        }
        Ok(())
    }

    impl_downcast!(Kamikaze);
}

/// Look for a target touching the kamikaze; on contact, kill it and explode.
pub(crate) fn update(world: &mut World, entity: EntityId, _step: &SimulationStep) {
    let Some(kamikaze) = world.component::<Kamikaze>(entity) else {
        return;
    };
    if kamikaze.exploding {
        return;
    }
    let Some(region) = world.component::<Spatial>(entity).map(Spatial::grid_region) else {
        return;
    };

    let victim = world
        .spatial()
        .intersecting(&region.grow(1))
        .into_iter()
        .find(|&candidate| {
            candidate != entity
                && !world.is_allied(entity, candidate)
                && world
                    .component::<Identity>(candidate)
                    .is_some_and(|identity| kamikaze.is_target(identity.prototype()))
                && world
                    .spatial()
                    .region_of(candidate)
                    .is_some_and(|other| Region::are_adjacent_or_intersecting(&region, &other))
        });

    if let Some(victim) = victim {
        tracing::debug!(kamikaze = %entity, %victim, "kamikaze contact");
        world.kill(victim);
        explode(world, entity);
    }
}

/// Detonate `source` and every kamikaze caught in the resulting chain.
///
/// Returns the number of explosions. Does nothing (and returns 0) if
/// `source` is not a live kamikaze.
pub fn explode(world: &mut World, source: EntityId) -> usize {
    let mut exploded: BTreeSet<EntityId> = BTreeSet::new();
    let mut damaged: BTreeSet<EntityId> = BTreeSet::new();
    let mut pending: VecDeque<EntityId> = VecDeque::from([source]);

    while let Some(bomber) = pending.pop_front() {
        if exploded.contains(&bomber) || !world.is_alive(bomber) {
            continue;
        }
        let Some(circle) = blast_of(world, bomber) else {
            continue;
        };
        let Some(damage) = world.stat_f32(bomber, Kamikaze::DAMAGE) else {
            continue;
        };
        if let Some(kamikaze) = world.component_mut::<Kamikaze>(bomber) {
            kamikaze.exploding = true;
        }
        exploded.insert(bomber);

        world.push_event(SimEvent::ExplosionOccurred {
            source: bomber,
            circle,
        });
        tracing::debug!(%bomber, radius = circle.radius, chain = exploded.len(), "explosion");
        world.kill(bomber);

        for victim in world.spatial().intersecting(&circle) {
            if exploded.contains(&victim) || !world.is_alive(victim) {
                continue;
            }
            if world
                .component::<Kamikaze>(victim)
                .is_some_and(|k| !k.exploding)
            {
                if !pending.contains(&victim) {
                    pending.push_back(victim);
                }
                continue;
            }
            if !world.has_component::<Health>(victim) || !damaged.insert(victim) {
                continue;
            }
            let Some(region) = world.spatial().region_of(victim) else {
                continue;
            };
            let amount =
                explosion_falloff(region.distance_to_point(circle.center), circle.radius) * damage;
            if amount > 0.0 {
                world.apply_damage(victim, amount);
            }
        }
    }
    exploded.len()
}

fn blast_of(world: &World, bomber: EntityId) -> Option<Circle> {
    let center = world.component::<Spatial>(bomber)?.center();
    let radius = world.stat_f32(bomber, Kamikaze::RADIUS)?;
    Some(Circle::new(center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Constitution;
    use crate::component::Component;
    use crate::spatial::CollisionLayer;
    use crate::world::WorldConfig;
    use glam::{IVec2, Vec2};

    fn place(world: &mut World, x: f32, components: Vec<Component>) -> EntityId {
        let mut all: Vec<Component> = vec![Spatial::new(Vec2::new(x, 0.0), IVec2::ONE, CollisionLayer::Ground).into()];
        all.extend(components);
        let id = world.create_entity(all);
        world.activate(id);
        id
    }

    #[test]
    fn single_blast_damages_with_falloff() {
        let mut world = World::new(WorldConfig::default());
        let bomb = place(&mut world, 10.0, vec![Kamikaze::new(100.0, 4.0, ["wall"]).into()]);
        let near = place(&mut world, 10.0, vec![Health::new(500, Constitution::Biological).into()]);
        let far = place(&mut world, 20.0, vec![Health::new(500, Constitution::Biological).into()]);

        assert_eq!(explode(&mut world, bomb), 1);
        assert!(!world.is_alive(bomb));
        // Overlapping footprint: distance 0, full damage.
        assert_eq!(world.current_health(near), Some(400.0));
        assert_eq!(world.current_health(far), Some(500.0));
        assert!(world
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::ExplosionOccurred { source, .. } if *source == bomb)));
    }

    #[test]
    fn chain_damages_each_victim_once() {
        let mut world = World::new(WorldConfig::default());
        let first = place(&mut world, 10.0, vec![Kamikaze::new(10.0, 3.0, ["wall"]).into()]);
        let second = place(&mut world, 12.0, vec![Kamikaze::new(10.0, 3.0, ["wall"]).into()]);
        let bystander = place(&mut world, 10.0, vec![Health::new(100, Constitution::Mechanical).into()]);

        assert_eq!(explode(&mut world, first), 2);
        assert!(!world.is_alive(second));
        assert_eq!(world.current_health(bystander), Some(90.0));
    }

    #[test]
    fn explode_on_dead_entity_is_a_no_op() {
        let mut world = World::new(WorldConfig::default());
        let bomb = place(&mut world, 1.0, vec![Kamikaze::new(1.0, 1.0, ["x"]).into()]);
        world.remove_entity(bomb);
        assert_eq!(explode(&mut world, bomb), 0);
    }
}
