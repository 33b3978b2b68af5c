//! Scenario files: everything needed to start a match.
//!
//! A scenario is a JSON document naming the tick rate, the map, the
//! factions, the prototype catalog and the starting entities:
//!
//! ```json
//! {
//!   "tick": { "fixed_dt": 0.05 },
//!   "world": { "width": 64, "height": 64, "cell_size": 8 },
//!   "factions": [
//!     { "name": "red", "technology": { "Attacker.Power": 2 } },
//!     { "name": "blue" }
//!   ],
//!   "prototypes": {
//!     "footman": [
//!       { "Spatial": { "size": [1, 1], "collision_layer": "Ground" } },
//!       { "Health": { "max_health": 40, "constitution": "Biological" } }
//!     ]
//!   },
//!   "entities": [
//!     { "prototype": "footman", "position": [3.0, 4.0], "faction": 0 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use skirmish_core::faction::{BasicFaction, DiplomaticStance, FactionId};
use skirmish_core::stat::{Stat, StatValue, StatValueKind};
use skirmish_core::world::{World, WorldConfig};

use crate::tick::{TickConfig, TickLoop};

// ---------------------------------------------------------------------------
// Scenario types
// ---------------------------------------------------------------------------

/// A complete match setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub world: WorldConfig,
    /// Factions in id order: the first one is `FactionId(0)`.
    #[serde(default)]
    pub factions: Vec<FactionConfig>,
    #[serde(default)]
    pub prototypes: BTreeMap<String, Value>,
    #[serde(default)]
    pub entities: Vec<SpawnConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionConfig {
    pub name: String,
    /// Indices of the factions this one is allied with. Alliances are
    /// one-sided unless both factions list each other.
    #[serde(default)]
    pub allies: Vec<u32>,
    /// Technology bonuses keyed by qualified stat name, e.g. `"Mobile.Speed"`.
    #[serde(default)]
    pub technology: BTreeMap<String, f64>,
}

/// An entity present when the match starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub prototype: String,
    pub position: Vec2,
    #[serde(default)]
    pub faction: Option<u32>,
    /// Start as a construction site at one health.
    #[serde(default)]
    pub under_construction: bool,
}

// ---------------------------------------------------------------------------
// Loading and building
// ---------------------------------------------------------------------------

impl ScenarioConfig {
    /// # Errors
    ///
    /// Fails if `json` is not a valid scenario document.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse scenario")
    }

    /// Read a scenario file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in scenario {}", path.display()))
    }

    /// Create the world described by this scenario and wrap it in a tick loop.
    ///
    /// # Errors
    ///
    /// Fails on an invalid time step or map, an unknown ally or stat, a
    /// malformed prototype, or a starting entity that cannot be spawned.
    pub fn build(&self) -> anyhow::Result<TickLoop> {
        let dt = self.tick.fixed_dt;
        if !(dt > 0.0 && dt.is_finite()) {
            bail!("fixed_dt must be positive and finite, got {dt}");
        }
        if self.world.width <= 0 || self.world.height <= 0 || self.world.cell_size <= 0 {
            bail!("world dimensions must be positive: {:?}", self.world);
        }

        let mut world = World::new(self.world);

        for (index, faction) in self.factions.iter().enumerate() {
            let built = self
                .build_faction(index, faction)
                .with_context(|| format!("in faction '{}'", faction.name))?;
            world.factions_mut().register(Box::new(built));
        }

        for (name, components) in &self.prototypes {
            world
                .prototypes_mut()
                .register_json(name, components.clone())
                .with_context(|| format!("in prototype '{name}'"))?;
        }

        for (index, spawn) in self.entities.iter().enumerate() {
            let faction = spawn.faction.map(FactionId);
            let result = if spawn.under_construction {
                world.spawn_under_construction(&spawn.prototype, spawn.position, faction)
            } else {
                world.spawn(&spawn.prototype, spawn.position, faction)
            };
            result.with_context(|| {
                format!("failed to spawn entity #{index} ('{}')", spawn.prototype)
            })?;
        }
        world.drain_events();

        tracing::debug!(
            factions = self.factions.len(),
            prototypes = self.prototypes.len(),
            entities = world.entity_count(),
            "scenario built"
        );
        Ok(TickLoop::new(world, self.tick.clone()))
    }

    fn build_faction(&self, index: usize, config: &FactionConfig) -> anyhow::Result<BasicFaction> {
        let mut faction = BasicFaction::new(config.name.as_str());

        for &ally in &config.allies {
            if ally as usize >= self.factions.len() || ally as usize == index {
                bail!("invalid ally index {ally}");
            }
            faction.set_stance(FactionId(ally), DiplomaticStance::ALLIED_VICTORY);
        }

        for (qualified, &amount) in &config.technology {
            let Some(stat) = Stat::find(qualified) else {
                bail!("unknown stat '{qualified}'");
            };
            let bonus = match stat.value_kind() {
                StatValueKind::Integer if amount.fract() == 0.0 => StatValue::Integer(amount as i32),
                StatValueKind::Integer => bail!("{stat} takes whole numbers, got {amount}"),
                StatValueKind::Real => StatValue::Real(amount as f32),
            };
            faction.set_technology_bonus(stat, bonus);
        }

        Ok(faction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::prelude::*;

    const SCENARIO: &str = r#"{
        "tick": { "fixed_dt": 0.5 },
        "world": { "width": 32, "height": 32, "cell_size": 4 },
        "factions": [
            { "name": "red", "allies": [1], "technology": { "Attacker.Power": 2, "Mobile.Speed": 0.5 } },
            { "name": "green", "allies": [0] },
            { "name": "blue" }
        ],
        "prototypes": {
            "spearman": [
                { "Spatial": { "size": [1, 1], "collision_layer": "Ground" } },
                { "Health": { "max_health": 40, "constitution": "Biological" } },
                { "Attacker": { "power": 5, "delay": 1.0 } },
                { "Mobile": { "speed": 1.0 } }
            ]
        },
        "entities": [
            { "prototype": "spearman", "position": [1.0, 1.0], "faction": 0 },
            { "prototype": "spearman", "position": [3.0, 1.0], "faction": 1 },
            { "prototype": "spearman", "position": [9.0, 9.0], "faction": 2 }
        ]
    }"#;

    #[test]
    fn scenario_builds_world() {
        let tick_loop = ScenarioConfig::from_json_str(SCENARIO).unwrap().build().unwrap();
        let world = tick_loop.world();
        assert_eq!(tick_loop.fixed_dt(), 0.5);
        assert_eq!(world.config().width, 32);
        assert_eq!(world.factions().len(), 3);
        assert_eq!(world.entity_count(), 3);
        assert!(world.events().is_empty());

        let ids = world.entity_ids();
        assert!(world.is_allied(ids[0], ids[1]));
        assert!(world.is_enemy(ids[0], ids[2]));
        assert_eq!(world.get_stat_value(ids[0], Attacker::POWER).unwrap(), StatValue::Integer(7));
        assert_eq!(world.get_stat_value(ids[0], Mobile::SPEED).unwrap(), StatValue::Real(1.5));
        assert_eq!(world.get_stat_value(ids[1], Attacker::POWER).unwrap(), StatValue::Integer(5));
    }

    #[test]
    fn missing_sections_default() {
        let config = ScenarioConfig::from_json_str("{}").unwrap();
        assert_eq!(config.tick, TickConfig::default());
        assert_eq!(config.world, WorldConfig::default());
        assert_eq!(config.build().unwrap().world().entity_count(), 0);
    }

    #[test]
    fn unknown_stat_is_reported() {
        let config = ScenarioConfig {
            factions: vec![FactionConfig {
                name: "red".to_owned(),
                technology: BTreeMap::from([("Attacker.Charisma".to_owned(), 1.0)]),
                ..Default::default()
            }],
            ..Default::default()
        };
        let message = format!("{:#}", config.build().unwrap_err());
        assert!(message.contains("unknown stat 'Attacker.Charisma'"), "{message}");
    }

    #[test]
    fn fractional_integer_bonus_is_rejected() {
        let config = ScenarioConfig {
            factions: vec![FactionConfig {
                name: "red".to_owned(),
                technology: BTreeMap::from([("Attacker.Power".to_owned(), 1.5)]),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn spawn_into_unknown_faction_fails() {
        let mut config = ScenarioConfig::from_json_str(SCENARIO).unwrap();
        config.entities[0].faction = Some(9);
        let message = format!("{:#}", config.build().unwrap_err());
        assert!(message.contains("entity #0"), "{message}");
    }

    #[test]
    fn load_reports_missing_file() {
        let error = ScenarioConfig::load("/nonexistent/scenario.json").unwrap_err();
        assert!(error.to_string().contains("failed to read scenario"));
    }
}
