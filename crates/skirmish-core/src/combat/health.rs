//! Health: accumulated damage against a max-health stat.

use serde::{Deserialize, Serialize};

use super::{ArmorType, Constitution};
use crate::component::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::entity::EntityId;
use crate::production::build::BuildProgress;
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::world::World;

/// Hit points of an entity.
///
/// Only damage taken is stored. Current health is the `MaxHealth` stat,
/// bonuses included, minus that damage, so a max-health upgrade raises
/// current health too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    max_health: i32,
    #[serde(default)]
    armor: i32,
    #[serde(default)]
    armor_type: ArmorType,
    constitution: Constitution,
    /// Hit points regained per second.
    #[serde(default)]
    regeneration: f32,
    #[serde(default)]
    damage: f32,
}

impl Health {
    pub const MAX_HEALTH: Stat = Stat::integer(ComponentKind::Health, "MaxHealth");
    pub const ARMOR: Stat = Stat::integer(ComponentKind::Health, "Armor");
    pub const REGENERATION: Stat = Stat::real(ComponentKind::Health, "Regeneration");

    pub fn new(max_health: i32, constitution: Constitution) -> Self {
        Self {
            max_health,
            armor: 0,
            armor_type: ArmorType::default(),
            constitution,
            regeneration: 0.0,
            damage: 0.0,
        }
    }

    pub fn with_armor(mut self, armor: i32, armor_type: ArmorType) -> Self {
        self.armor = armor;
        self.armor_type = armor_type;
        self
    }

    pub fn with_regeneration(mut self, regeneration: f32) -> Self {
        self.regeneration = regeneration;
        self
    }

    #[inline]
    pub fn armor_type(&self) -> ArmorType {
        self.armor_type
    }

    #[inline]
    pub fn constitution(&self) -> Constitution {
        self.constitution
    }

    /// Damage taken so far.
    #[inline]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn is_damaged(&self) -> bool {
        self.damage > 0.0
    }

    pub(crate) fn set_damage(&mut self, damage: f32) {
        self.damage = damage.max(0.0);
    }

    pub(crate) fn add_damage(&mut self, amount: f32) {
        self.damage += amount;
    }

    /// Remove up to `amount` damage; returns how much was removed.
    pub(crate) fn restore(&mut self, amount: f32) -> f32 {
        let healed = amount.clamp(0.0, self.damage);
        self.damage -= healed;
        healed
    }
}

impl ComponentData for Health {
    const KIND: ComponentKind = ComponentKind::Health;
    const STATS: &'static [Stat] = &[Self::MAX_HEALTH, Self::ARMOR, Self::REGENERATION];
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("max_health"),
        Property::persistent("armor"),
        Property::persistent("armor_type"),
        Property::mandatory("constitution"),
        Property::persistent("regeneration"),
        Property::persistent("damage"),
        Property::transient("current_health"),
    ];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::MAX_HEALTH => Some(StatValue::Integer(self.max_health)),
            Self::ARMOR => Some(StatValue::Integer(self.armor)),
            Self::REGENERATION => Some(StatValue::Real(self.regeneration)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_health <= 0 {
            return Err(format!("max health must be positive, got {}", self.max_health));
        }
        if !(self.damage >= 0.0 && self.damage.is_finite()) {
            return Err(format!("damage must be non-negative, got {}", self.damage));
        }
        if !self.regeneration.is_finite() {
            return Err("regeneration must be finite".to_owned());
        }
        Ok(())
    }

    impl_downcast!(Health);
}

/// Regenerate. Entities under construction do not heal on their own.
pub(crate) fn update(world: &mut World, entity: EntityId, step: &SimulationStep) {
    if world.has_component::<BuildProgress>(entity) {
        return;
    }
    let Some(rate) = world.stat_f32(entity, Health::REGENERATION) else {
        return;
    };
    if rate <= 0.0 {
        return;
    }
    if let Some(health) = world.component_mut::<Health>(entity) {
        health.restore(rate * step.time_delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldConfig;

    #[test]
    fn current_health_is_max_minus_damage() {
        let mut world = World::new(WorldConfig::default());
        let id = world.create_entity(vec![Health::new(50, Constitution::Biological).into()]);
        world.activate(id);
        assert!(!world.apply_damage(id, 20.0));
        assert_eq!(world.current_health(id), Some(30.0));
    }

    #[test]
    fn regeneration_never_overheals() {
        let mut world = World::new(WorldConfig::default());
        let id = world.create_entity(vec![Health::new(10, Constitution::Biological)
            .with_regeneration(4.0)
            .into()]);
        world.activate(id);
        world.apply_damage(id, 3.0);
        world.update(&SimulationStep::new(0, 0.0, 0.5));
        assert_eq!(world.current_health(id), Some(9.0));
        world.update(&SimulationStep::new(1, 0.5, 0.5));
        assert_eq!(world.current_health(id), Some(10.0));
        assert_eq!(world.component::<Health>(id).unwrap().damage(), 0.0);
    }

    #[test]
    fn armor_defaults_when_omitted() {
        let health: Health =
            serde_json::from_str(r#"{"max_health": 40, "constitution": "Mechanical"}"#).unwrap();
        assert_eq!(health.base_stat(Health::ARMOR), Some(StatValue::Integer(0)));
        assert_eq!(health.armor_type(), ArmorType::Unarmored);
    }
}
