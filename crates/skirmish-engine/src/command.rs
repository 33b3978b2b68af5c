//! Lockstep player commands.
//!
//! Every peer of a match applies the same [`IssuedCommand`]s at the start of
//! the same tick, in submission order. A command is checked against the
//! issuing faction before anything is mutated; a rejected command leaves the
//! world untouched and never aborts the tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use skirmish_core::entity::EntityId;
use skirmish_core::faction::FactionId;
use skirmish_core::production::BuildTask;
use skirmish_core::spatial::Region;
use skirmish_core::task::{AttackTask, MoveTask, Task, TaskHandle, TaskQueue};
use skirmish_core::world::World;
use skirmish_core::{component::Component, SimError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a player command was rejected.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The simulation refused the operation.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// A command addressed no units.
    #[error("command addresses no units")]
    NoUnits,

    /// The issuing faction does not control the entity.
    #[error("entity {entity} is not controlled by {faction}")]
    NotOwned { entity: EntityId, faction: FactionId },

    /// The entity cannot take orders.
    #[error("entity {entity} cannot take orders")]
    NotCommandable { entity: EntityId },

    /// The target of an attack or build order is not a valid one.
    #[error("entity {target} is not a valid target")]
    InvalidTarget { target: EntityId },

    /// A position is not a finite point on the map.
    #[error("position {position} is outside the map")]
    InvalidPosition { position: Vec2 },

    /// The building footprint is occupied or off the map.
    #[error("cannot place '{prototype}' at {position}")]
    PlacementBlocked { prototype: String, position: Vec2 },
}

// ---------------------------------------------------------------------------
// PlayerCommand
// ---------------------------------------------------------------------------

/// An order given by a player.
///
/// Orders with a `queued` flag are appended to each unit's task queue when
/// set, and replace the queue otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    Move {
        units: Vec<EntityId>,
        destination: Vec2,
        #[serde(default)]
        queued: bool,
    },
    Attack {
        units: Vec<EntityId>,
        target: EntityId,
        #[serde(default)]
        queued: bool,
    },
    /// Lay the foundation of a building and send builders to it.
    PlaceBuilding {
        prototype: String,
        position: Vec2,
        #[serde(default)]
        builders: Vec<EntityId>,
    },
    Build {
        units: Vec<EntityId>,
        site: EntityId,
        #[serde(default)]
        queued: bool,
    },
    Train { trainer: EntityId, prototype: String },
    CancelTask { entity: EntityId, handle: TaskHandle },
    /// Drop every queued task.
    Stop { units: Vec<EntityId> },
}

/// A command tagged with the faction that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCommand {
    pub faction: FactionId,
    pub command: PlayerCommand,
}

impl IssuedCommand {
    pub fn new(faction: FactionId, command: PlayerCommand) -> Self {
        Self { faction, command }
    }

    /// Apply the command to `world`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the command is rejected. Validation
    /// happens first, so a rejected command changes nothing.
    pub fn apply(&self, world: &mut World) -> Result<(), CommandError> {
        let faction = self.faction;
        match &self.command {
            PlayerCommand::Move {
                units,
                destination,
                queued,
            } => {
                check_position(world, *destination)?;
                check_units(world, faction, units)?;
                order(world, units, *queued, |unit| {
                    Box::new(MoveTask::new(unit, *destination))
                })
            }
            PlayerCommand::Attack {
                units,
                target,
                queued,
            } => {
                check_units(world, faction, units)?;
                if !world.is_in_world(*target) || units.iter().any(|&unit| !world.is_enemy(unit, *target)) {
                    return Err(CommandError::InvalidTarget { target: *target });
                }
                order(world, units, *queued, |unit| {
                    Box::new(AttackTask::new(unit, *target))
                })
            }
            PlayerCommand::PlaceBuilding {
                prototype,
                position,
                builders,
            } => {
                check_position(world, *position)?;
                check_owned(world, faction, builders)?;
                check_placement(world, prototype, *position)?;
                let site = world.spawn_under_construction(prototype, *position, Some(faction))?;
                tracing::debug!(%faction, %site, prototype = prototype.as_str(), "building placed");
                order(world, builders, false, |unit| Box::new(BuildTask::new(unit, site)))
            }
            PlayerCommand::Build {
                units,
                site,
                queued,
            } => {
                check_units(world, faction, units)?;
                if !world.is_in_world(*site) || world.faction_of(*site) != Some(faction) {
                    return Err(CommandError::InvalidTarget { target: *site });
                }
                order(world, units, *queued, |unit| Box::new(BuildTask::new(unit, *site)))
            }
            PlayerCommand::Train { trainer, prototype } => {
                check_owned(world, faction, &[*trainer])?;
                world.train(*trainer, prototype)?;
                Ok(())
            }
            PlayerCommand::CancelTask { entity, handle } => {
                check_owned(world, faction, &[*entity])?;
                world.cancel_task(*entity, *handle)?;
                Ok(())
            }
            PlayerCommand::Stop { units } => {
                check_units(world, faction, units)?;
                for &unit in units {
                    world.clear_tasks(unit)?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn check_owned(world: &World, faction: FactionId, entities: &[EntityId]) -> Result<(), CommandError> {
    for &entity in entities {
        if !world.is_alive(entity) {
            return Err(SimError::StaleEntity { entity }.into());
        }
        if world.faction_of(entity) != Some(faction) {
            return Err(CommandError::NotOwned { entity, faction });
        }
        if !world.has_component::<TaskQueue>(entity) {
            return Err(CommandError::NotCommandable { entity });
        }
    }
    Ok(())
}

fn check_units(world: &World, faction: FactionId, units: &[EntityId]) -> Result<(), CommandError> {
    if units.is_empty() {
        return Err(CommandError::NoUnits);
    }
    check_owned(world, faction, units)
}

/// The point must be finite and inside the map rectangle, edges included.
fn check_position(world: &World, position: Vec2) -> Result<(), CommandError> {
    let bounds = world.spatial().bounds();
    let inside = position.is_finite()
        && position.cmpge(bounds.min().as_vec2()).all()
        && position.cmple(bounds.max().as_vec2()).all();
    if !inside {
        return Err(CommandError::InvalidPosition { position });
    }
    Ok(())
}

fn check_placement(world: &World, prototype: &str, position: Vec2) -> Result<(), CommandError> {
    let components = world.prototypes().instantiate(prototype)?;
    let footprint = components.iter().find_map(|component| match component {
        Component::Spatial(spatial) => Some((spatial.size(), spatial.collision_layer())),
        _ => None,
    });
    let Some((size, layer)) = footprint else {
        return Ok(());
    };
    let region = Region::new(position.round().as_ivec2(), size);
    if !world.spatial().is_free(&region, layer) {
        return Err(CommandError::PlacementBlocked {
            prototype: prototype.to_owned(),
            position,
        });
    }
    Ok(())
}

/// Give each unit a fresh task from `make`, queued or replacing its queue.
fn order<F>(world: &mut World, units: &[EntityId], queued: bool, make: F) -> Result<(), CommandError>
where
    F: Fn(EntityId) -> Box<dyn Task>,
{
    for &unit in units {
        let task = make(unit);
        if queued {
            world.enqueue_task(unit, task)?;
        } else {
            world.override_task(unit, task)?;
        }
    }
    Ok(())
}
