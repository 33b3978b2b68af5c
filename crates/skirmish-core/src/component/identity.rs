//! Identity and cost components.

use serde::{Deserialize, Serialize};

use super::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::stat::{Stat, StatValue};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which prototype an entity was instantiated from.
///
/// The prototype factory attaches this component automatically. Kamikaze
/// target sets and trainer catalogs refer to prototypes by this name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    prototype: String,
}

impl Identity {
    pub fn new(prototype: impl Into<String>) -> Self {
        Self {
            prototype: prototype.into(),
        }
    }

    /// Name of the prototype this entity was created from.
    pub fn prototype(&self) -> &str {
        &self.prototype
    }
}

impl ComponentData for Identity {
    const KIND: ComponentKind = ComponentKind::Identity;
    const PROPERTIES: &'static [Property] = &[Property::mandatory("prototype")];

    fn validate(&self) -> Result<(), String> {
        if self.prototype.is_empty() {
            return Err("prototype name must not be empty".to_owned());
        }
        Ok(())
    }

    impl_downcast!(Identity);
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// What producing an entity costs its faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Seconds of work needed to build or train the entity.
    production_time: f32,
    /// Food reserved for as long as the entity exists.
    #[serde(default)]
    food: i32,
}

impl Cost {
    pub const FOOD_COST: Stat = Stat::integer(ComponentKind::Cost, "FoodCost");
    pub const PRODUCTION_TIME: Stat = Stat::real(ComponentKind::Cost, "ProductionTime");

    pub fn new(production_time: f32, food: i32) -> Self {
        Self {
            production_time,
            food,
        }
    }
}

impl ComponentData for Cost {
    const KIND: ComponentKind = ComponentKind::Cost;
    const STATS: &'static [Stat] = &[Self::FOOD_COST, Self::PRODUCTION_TIME];
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("production_time"),
        Property::persistent("food"),
    ];

    fn base_stat(&self, stat: Stat) -> Option<StatValue> {
        match stat {
            Self::FOOD_COST => Some(StatValue::Integer(self.food)),
            Self::PRODUCTION_TIME => Some(StatValue::Real(self.production_time)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.production_time > 0.0 && self.production_time.is_finite()) {
            return Err(format!(
                "production time must be positive and finite, got {}",
                self.production_time
            ));
        }
        if self.food < 0 {
            return Err(format!("food cost must not be negative, got {}", self.food));
        }
        Ok(())
    }

    impl_downcast!(Cost);
}
