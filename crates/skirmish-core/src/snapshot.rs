//! Serializable world state.
//!
//! A [`WorldSnapshot`] holds every entity with its persistent component
//! properties. Transient state is rebuilt on restore:
//!
//! - the spatial index, from each in-world entity's `Spatial`;
//! - food reservations, from `Cost` and `FactionMembership`;
//! - task queues restart empty (their handle counters survive).
//!
//! Because queued tasks are not kept, a unit that was still being trained
//! has nobody to finish it and is discarded on restore.
//!
//! Factions and prototypes are configuration, not state: restoring keeps
//! the target world's registries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::Component;
use crate::entity::{Entity, EntityAllocator, EntityId, EntityState};
use crate::production::TrainProgress;
use crate::world::{World, WorldConfig};
use crate::SimError;

/// One entity inside a [`WorldSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub state: EntityState,
    /// Components in registration order, in their serialized form.
    pub components: Vec<Value>,
}

/// Complete serializable state of a [`World`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub config: WorldConfig,
    pub allocator: EntityAllocator,
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Capture `world`, entities in ascending index order.
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedSnapshot`] if a component fails to serialize.
    pub fn capture(world: &World) -> Result<Self, SimError> {
        let mut entities = Vec::with_capacity(world.entity_count());
        for id in world.entity_ids() {
            let Some(entity) = world.entity(id) else {
                continue;
            };
            let components = entity
                .components()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SimError::MalformedSnapshot {
                    details: format!("entity {id}: {e}"),
                })?;
            entities.push(EntitySnapshot {
                id,
                state: entity.state(),
                components,
            });
        }
        Ok(Self {
            config: *world.config(),
            allocator: world.allocator().clone(),
            entities,
        })
    }

    /// Replace `world`'s entities with the captured ones.
    ///
    /// Pending events are dropped. On error `world` is left untouched.
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedSnapshot`] if the entity table disagrees with
    /// the allocator, a component does not deserialize or validate, or an
    /// entity is listed as dead.
    pub fn restore(&self, world: &mut World) -> Result<(), SimError> {
        let malformed = |details: String| SimError::MalformedSnapshot { details };

        if self.entities.len() != self.allocator.alive_count() {
            return Err(malformed(format!(
                "{} entities listed but {} allocated",
                self.entities.len(),
                self.allocator.alive_count()
            )));
        }

        let mut entities = Vec::with_capacity(self.entities.len());
        let mut seen = BTreeSet::new();
        for saved in &self.entities {
            let id = saved.id;
            if !seen.insert(id) {
                return Err(malformed(format!("entity {id} listed twice")));
            }
            if !self.allocator.is_alive(id) {
                return Err(malformed(format!("entity {id} is not allocated")));
            }
            if saved.state == EntityState::Dead {
                return Err(malformed(format!("entity {id} is dead")));
            }
            let mut entity = Entity::new(id);
            for value in &saved.components {
                let component: Component = serde_json::from_value(value.clone())
                    .map_err(|e| malformed(format!("entity {id}: {e}")))?;
                let kind = component.kind();
                component
                    .validate()
                    .map_err(|e| malformed(format!("entity {id}, {kind}: {e}")))?;
                if entity.has(kind) {
                    return Err(malformed(format!("entity {id} lists {kind} twice")));
                }
                entity.add_component(component);
            }
            entity.set_state(saved.state);
            entities.push(entity);
        }

        let (factions, prototypes) = world.take_registries();
        *world = World::from_parts(
            self.config,
            self.allocator.clone(),
            entities,
            factions,
            prototypes,
        );

        let orphans: Vec<EntityId> = world
            .entity_ids()
            .into_iter()
            .filter(|&id| {
                world.state(id) == Some(EntityState::Inactive)
                    && world.has_component::<TrainProgress>(id)
            })
            .collect();
        for id in &orphans {
            world.remove_entity(*id);
        }
        world.drain_events();

        tracing::debug!(
            entities = world.entity_count(),
            discarded_trainees = orphans.len(),
            "world restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Constitution, Health};
    use crate::component::{Cost, Mobile};
    use crate::faction::{BasicFaction, FactionMembership};
    use crate::spatial::{CollisionLayer, Spatial};
    use crate::step::SimulationStep;
    use crate::task::{MoveTask, TaskQueue};
    use glam::{IVec2, Vec2};

    fn sample_world() -> (World, EntityId) {
        let mut world = World::new(WorldConfig::default());
        let red = world.factions_mut().register(Box::new(BasicFaction::new("red")));
        let id = world.create_entity(vec![
            Spatial::new(Vec2::new(4.0, 4.0), IVec2::ONE, CollisionLayer::Ground).into(),
            Health::new(30, Constitution::Biological).into(),
            Mobile::new(1.0).into(),
            Cost::new(10.0, 1).into(),
            FactionMembership::new(red).into(),
            TaskQueue::new().into(),
        ]);
        world.activate(id);
        (world, id)
    }

    #[test]
    fn capture_restore_capture_is_stable() {
        let (mut world, id) = sample_world();
        world.apply_damage(id, 12.5);
        let first = WorldSnapshot::capture(&world).unwrap();

        let mut other = World::new(WorldConfig::default());
        other
            .factions_mut()
            .register(Box::new(BasicFaction::new("red")));
        first.restore(&mut other).unwrap();

        assert_eq!(WorldSnapshot::capture(&other).unwrap(), first);
        assert_eq!(other.current_health(id), Some(17.5));
        assert!(other.spatial().contains(id));
        assert!(other.is_consistent());
    }

    #[test]
    fn handle_counters_survive_but_tasks_do_not() {
        let (mut world, id) = sample_world();
        world
            .enqueue_task(id, Box::new(MoveTask::new(id, Vec2::new(20.5, 4.5))))
            .unwrap();
        let snapshot = WorldSnapshot::capture(&world).unwrap();
        snapshot.restore(&mut world).unwrap();

        let queue = world.component::<TaskQueue>(id).unwrap();
        assert!(queue.is_empty());
        let handle = world
            .enqueue_task(id, Box::new(MoveTask::new(id, Vec2::new(20.5, 4.5))))
            .unwrap();
        assert_eq!(handle.raw(), 2);

        world.update(&SimulationStep::new(0, 0.0, 1.0));
        assert!(world.drain_events().len() >= 1);
    }

    #[test]
    fn allocator_mismatch_is_rejected() {
        let (world, _) = sample_world();
        let mut snapshot = WorldSnapshot::capture(&world).unwrap();
        snapshot.entities.clear();

        let mut target = World::new(WorldConfig::default());
        let err = snapshot.restore(&mut target).unwrap_err();
        assert!(matches!(err, SimError::MalformedSnapshot { .. }));
        assert_eq!(target.entity_count(), 0);
    }

    #[test]
    fn duplicate_entity_ids_are_rejected() {
        let (mut world, _) = sample_world();
        let second = world.create_entity(vec![
            Spatial::new(Vec2::new(9.0, 9.0), IVec2::ONE, CollisionLayer::Ground).into(),
            Mobile::new(1.0).into(),
        ]);
        world.activate(second);
        let mut snapshot = WorldSnapshot::capture(&world).unwrap();
        assert_eq!(snapshot.entities.len(), 2);
        snapshot.entities[1].id = snapshot.entities[0].id;

        let (mut target, kept) = sample_world();
        let before = WorldSnapshot::capture(&target).unwrap();
        let err = snapshot.restore(&mut target).unwrap_err();
        assert!(matches!(
            err,
            SimError::MalformedSnapshot { ref details } if details.contains("listed twice")
        ));
        assert_eq!(WorldSnapshot::capture(&target).unwrap(), before);
        assert!(target.spatial().contains(kept));
    }
}
