//! Combat: health, attacks, splash damage, healing, and kamikaze chains.
//!
//! The damage formulas are free functions so they can be checked in
//! isolation; the components in the submodules read their inputs from stats
//! and apply the results through the [`World`](crate::world::World).

pub mod attacker;
pub mod healer;
pub mod health;
pub mod kamikaze;

use serde::{Deserialize, Serialize};

pub use attacker::Attacker;
pub use healer::Healer;
pub use health::Health;
pub use kamikaze::Kamikaze;

/// Type of armor protecting an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArmorType {
    /// No armor (infantry).
    #[default]
    Unarmored,
    /// Light armor (scouts, light vehicles).
    Light,
    /// Heavy armor (tanks).
    Heavy,
    /// Buildings.
    Structure,
}

/// What kind of body an entity has. Healers mend biological entities,
/// builders repair mechanical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constitution {
    Biological,
    Mechanical,
}

/// How an attacker's power relates to a target's armor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DamageModifier {
    #[default]
    Normal,
    /// Power is doubled.
    SuperEffective,
    /// Power is halved (rounded down).
    Ineffective,
}

/// Damage of one hit: power adjusted by the modifier, minus armor, never
/// negative.
pub fn compute_damage(power: i32, armor: i32, modifier: DamageModifier) -> i32 {
    let power = match modifier {
        DamageModifier::Normal => power,
        DamageModifier::SuperEffective => power.saturating_mul(2),
        DamageModifier::Ineffective => power / 2,
    };
    power.saturating_sub(armor).max(0)
}

/// Linear splash falloff: 1 at the center, 0 at and beyond `radius`.
pub fn splash_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Explosion falloff: `1 - (d/r)^5`, flat near the center and dropping
/// sharply toward the rim.
pub fn explosion_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - (distance / radius).powi(5)).clamp(0.0, 1.0)
}
