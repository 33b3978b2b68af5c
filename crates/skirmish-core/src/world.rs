//! The world: entity storage, the spatial index, factions, prototypes, and
//! the event queue, plus the per-tick update.
//!
//! # Update order
//!
//! [`World::update`] visits the entities that were active when the tick
//! began, in ascending index order. Each entity's components are updated in
//! the order they were added. An entity that dies or falls asleep mid-tick
//! is not updated further. Entities created during a tick are first updated
//! on the next one.
//!
//! # Invariants
//!
//! - An entity is in the spatial index if and only if it is active or
//!   asleep and has a [`Spatial`] component.
//! - Mutating a removed entity is a programming error and panics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::{attacker, healer, health, kamikaze, Health};
use crate::component::{Component, ComponentData, ComponentKind, Cost};
use crate::entity::{Entity, EntityAllocator, EntityId, EntityState};
use crate::event::SimEvent;
use crate::faction::{FactionId, FactionMembership, FactionRegistry};
use crate::production::{self, BuildProgress, TrainProgress, TrainTask, Trainer};
use crate::prototype::PrototypeRegistry;
use crate::spatial::{CollisionLayer, Spatial, SpatialManager};
use crate::stat::{Stat, StatValue};
use crate::step::SimulationStep;
use crate::task::{queue, Task, TaskHandle, TaskQueue};
use crate::SimError;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Map dimensions and spatial index granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Map width in tiles.
    pub width: i32,
    /// Map height in tiles.
    pub height: i32,
    /// Edge length of one spatial index cell, in tiles.
    pub cell_size: i32,
}

impl Default for WorldConfig {
    /// A 128x128 map with 8x8 index cells.
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            cell_size: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Authoritative simulation state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    allocator: EntityAllocator,
    /// Indexed by `EntityId::index()`.
    entities: Vec<Option<Entity>>,
    spatial: SpatialManager,
    factions: FactionRegistry,
    prototypes: PrototypeRegistry,
    events: Vec<SimEvent>,
}

impl World {
    /// # Panics
    ///
    /// Panics if a dimension in `config` is not positive.
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            allocator: EntityAllocator::new(),
            entities: Vec::new(),
            spatial: SpatialManager::new(config.width, config.height, config.cell_size),
            factions: FactionRegistry::new(),
            prototypes: PrototypeRegistry::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn spatial(&self) -> &SpatialManager {
        &self.spatial
    }

    pub fn factions(&self) -> &FactionRegistry {
        &self.factions
    }

    pub fn factions_mut(&mut self) -> &mut FactionRegistry {
        &mut self.factions
    }

    pub fn prototypes(&self) -> &PrototypeRegistry {
        &self.prototypes
    }

    pub fn prototypes_mut(&mut self) -> &mut PrototypeRegistry {
        &mut self.prototypes
    }

    pub(crate) fn allocator(&self) -> &EntityAllocator {
        &self.allocator
    }

    // -----------------------------------------------------------------------
    // Entity access
    // -----------------------------------------------------------------------

    /// Whether `id` names a live (not yet removed) entity.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Whether `id` is live and active or asleep.
    pub fn is_in_world(&self, id: EntityId) -> bool {
        self.state(id).is_some_and(EntityState::is_in_world)
    }

    pub fn state(&self, id: EntityId) -> Option<EntityState> {
        self.entity(id).map(Entity::state)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.entities.get(id.index() as usize)?.as_ref()
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.entities.get_mut(id.index() as usize)?.as_mut()
    }

    fn expect_entity_mut(&mut self, id: EntityId) -> &mut Entity {
        self.entity_mut(id)
            .unwrap_or_else(|| panic!("entity {id} was removed"))
    }

    /// Live entity ids in ascending index order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .flatten()
            .map(Entity::id)
            .collect()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Typed access to a component of a live entity.
    pub fn component<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.entity(id)?.get::<T>()
    }

    pub(crate) fn component_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entity_mut(id)?.get_mut::<T>()
    }

    pub fn has_component<T: ComponentData>(&self, id: EntityId) -> bool {
        self.component::<T>(id).is_some()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create an inactive entity from `components`.
    ///
    /// A faction member reserves its `Cost::FOOD_COST` from the faction here.
    ///
    /// # Panics
    ///
    /// Panics if two components share a kind.
    pub fn create_entity(&mut self, components: Vec<Component>) -> EntityId {
        let id = self.allocator.allocate();
        let mut entity = Entity::new(id);
        for component in components {
            entity.add_component(component);
        }

        let index = id.index() as usize;
        if self.entities.len() <= index {
            self.entities.resize_with(index + 1, || None);
        }
        self.entities[index] = Some(entity);

        self.acquire_food_token(id);
        tracing::trace!(entity = %id, "entity created");
        id
    }

    fn acquire_food_token(&mut self, id: EntityId) {
        let Some(faction) = self.faction_of(id) else {
            return;
        };
        let food = self.stat_i32(id, Cost::FOOD_COST).unwrap_or(0);
        if food <= 0 {
            return;
        }
        let Some(faction) = self.factions.get_mut(faction) else {
            return;
        };
        let token = faction.create_food_token(food);
        if let Some(membership) = self.component_mut::<FactionMembership>(id) {
            membership.hold_food_token(token);
        }
    }

    /// Make an inactive entity part of the live world.
    ///
    /// # Panics
    ///
    /// Panics if the entity was removed or is not inactive.
    pub fn activate(&mut self, id: EntityId) {
        let entity = self.expect_entity_mut(id);
        assert_eq!(
            entity.state(),
            EntityState::Inactive,
            "only inactive entities can be activated ({id})"
        );
        entity.set_state(EntityState::Active);
        let footprint = entity
            .get::<Spatial>()
            .map(|s| (s.grid_region(), s.collision_layer()));
        if let Some((region, layer)) = footprint {
            self.spatial.add(id, region, layer);
        }
        self.events.push(SimEvent::EntityAdded { entity: id });
    }

    /// Remove an entity: deactivate every component, dispose queued tasks,
    /// and discard it. Returns `false` if it was already gone.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entity_mut(id) else {
            return false;
        };
        entity.set_state(EntityState::Dead);
        let tasks = entity
            .get_mut::<TaskQueue>()
            .map(TaskQueue::clear)
            .unwrap_or_default();
        if let Some(membership) = entity.get_mut::<FactionMembership>() {
            membership.release_food_token();
        }
        self.spatial.remove(id);

        self.entities[id.index() as usize] = None;
        self.allocator.deallocate(id);

        tracing::debug!(entity = %id, disposed_tasks = tasks.len(), "entity removed");
        self.events.push(SimEvent::EntityRemoved { entity: id });
        self.dispose_tasks(tasks);
        true
    }

    /// Destroy an entity as a game event (death, detonation).
    pub fn kill(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.events.push(SimEvent::Died { entity: id });
        self.remove_entity(id)
    }

    /// Put an active entity to sleep or wake an asleep one. Sleeping
    /// entities keep their place in the spatial index but are not updated.
    pub fn set_asleep(&mut self, id: EntityId, asleep: bool) {
        let entity = self.expect_entity_mut(id);
        match (entity.state(), asleep) {
            (EntityState::Active, true) => entity.set_state(EntityState::Asleep),
            (EntityState::Asleep, false) => entity.set_state(EntityState::Active),
            _ => {}
        }
    }

    /// Put every entity of `faction` to sleep, or wake them all.
    pub fn set_faction_asleep(&mut self, faction: FactionId, asleep: bool) {
        for id in self.entity_ids() {
            if self.faction_of(id) == Some(faction) {
                self.set_asleep(id, asleep);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    fn instantiate(
        &self,
        prototype: &str,
        position: Vec2,
        faction: Option<FactionId>,
    ) -> Result<Vec<Component>, SimError> {
        if let Some(faction) = faction {
            if !self.factions.contains(faction) {
                return Err(SimError::UnknownFaction { faction });
            }
        }
        let mut components = self.prototypes.instantiate(prototype)?;
        for component in &mut components {
            if let Component::Spatial(spatial) = component {
                spatial.set_position(position);
            }
        }
        if let Some(faction) = faction {
            components.push(FactionMembership::new(faction).into());
        }
        Ok(components)
    }

    /// Create and activate an entity from a prototype.
    ///
    /// `position` is the minimum corner of the footprint.
    pub fn spawn(
        &mut self,
        prototype: &str,
        position: Vec2,
        faction: Option<FactionId>,
    ) -> Result<EntityId, SimError> {
        let components = self.instantiate(prototype, position, faction)?;
        let id = self.create_entity(components);
        self.activate(id);
        tracing::debug!(entity = %id, prototype, "spawned");
        Ok(id)
    }

    /// Place a building that still has to be constructed.
    ///
    /// The entity starts at 1 hit point; its behaviours are withheld in a
    /// [`BuildProgress`] until builders finish it.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`World::spawn`], fails with
    /// [`SimError::MalformedPrototype`] if the prototype has no `Cost`.
    pub fn spawn_under_construction(
        &mut self,
        prototype: &str,
        position: Vec2,
        faction: Option<FactionId>,
    ) -> Result<EntityId, SimError> {
        let components = self.instantiate(prototype, position, faction)?;
        let required_time = production_time(prototype, &components)?;
        let (mut visible, hidden) = production::conceal(components);
        visible.push(BuildProgress::new(required_time, hidden).into());

        let id = self.create_entity(visible);
        production::start_at_one_health(self, id);
        self.activate(id);
        tracing::debug!(entity = %id, prototype, required_time, "construction site placed");
        Ok(id)
    }

    /// Create the inactive trainee of `trainer` for `prototype`.
    pub(crate) fn create_trainee(
        &mut self,
        prototype: &str,
        trainer: EntityId,
    ) -> Result<EntityId, SimError> {
        let position = self
            .component::<Spatial>(trainer)
            .map_or(Vec2::ZERO, Spatial::position);
        let components = self.instantiate(prototype, position, self.faction_of(trainer))?;
        let required_time = production_time(prototype, &components)?;
        let (mut visible, hidden) = production::conceal(components);
        visible.push(TrainProgress::new(required_time, hidden, trainer).into());

        let id = self.create_entity(visible);
        production::start_at_one_health(self, id);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Stats and relations
    // -----------------------------------------------------------------------

    /// Final value of `stat` for `id`, faction bonuses included.
    ///
    /// # Errors
    ///
    /// [`SimError::StaleEntity`] for a removed entity,
    /// [`SimError::MissingComponent`] if it lacks the declaring component.
    pub fn get_stat_value(&self, id: EntityId, stat: Stat) -> Result<StatValue, SimError> {
        let entity = self
            .entity(id)
            .ok_or(SimError::StaleEntity { entity: id })?;
        entity.get_stat_value(stat, &self.factions)
    }

    /// `stat` as a real, or `None` if the entity cannot have it.
    pub(crate) fn stat_f32(&self, id: EntityId, stat: Stat) -> Option<f32> {
        self.get_stat_value(id, stat).ok().map(StatValue::to_f32)
    }

    /// `stat` as an integer, or `None` if the entity cannot have it.
    pub(crate) fn stat_i32(&self, id: EntityId, stat: Stat) -> Option<i32> {
        self.get_stat_value(id, stat).ok().map(StatValue::to_i32)
    }

    pub fn faction_of(&self, id: EntityId) -> Option<FactionId> {
        self.component::<FactionMembership>(id)
            .map(FactionMembership::faction)
    }

    /// Whether `a` regards `b` as an ally. Entities without a faction have
    /// no allies.
    pub fn is_allied(&self, a: EntityId, b: EntityId) -> bool {
        match (self.faction_of(a), self.faction_of(b)) {
            (Some(fa), Some(fb)) => self.factions.are_allied(fa, fb),
            _ => false,
        }
    }

    /// Whether `a` regards `b` as an enemy. Both need a faction.
    pub fn is_enemy(&self, a: EntityId, b: EntityId) -> bool {
        match (self.faction_of(a), self.faction_of(b)) {
            (Some(fa), Some(fb)) => !self.factions.are_allied(fa, fb),
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Move an entity's footprint so its minimum corner is at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the entity was removed or has no `Spatial`.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        let entity = self.expect_entity_mut(id);
        let in_world = entity.state().is_in_world();
        let spatial = entity
            .get_mut::<Spatial>()
            .unwrap_or_else(|| panic!("entity {id} has no Spatial"));
        if spatial.position() == position {
            return;
        }
        spatial.set_position(position);
        let region = spatial.grid_region();
        if in_world {
            self.spatial.update_region(id, region);
            self.events.push(SimEvent::Moved {
                entity: id,
                position,
            });
        }
    }

    /// Move an entity to another collision layer.
    ///
    /// # Panics
    ///
    /// Panics if the entity was removed or has no `Spatial`.
    pub fn set_collision_layer(&mut self, id: EntityId, layer: CollisionLayer) {
        let entity = self.expect_entity_mut(id);
        let in_world = entity.state().is_in_world();
        entity
            .get_mut::<Spatial>()
            .unwrap_or_else(|| panic!("entity {id} has no Spatial"))
            .set_collision_layer(layer);
        if in_world {
            self.spatial.update_layer(id, layer);
        }
    }

    /// Current health: `MaxHealth` minus damage taken.
    pub fn current_health(&self, id: EntityId) -> Option<f32> {
        let max = self.stat_f32(id, Health::MAX_HEALTH)?;
        Some(max - self.component::<Health>(id)?.damage())
    }

    /// Deal `amount` damage. Kills the entity when its health reaches zero.
    /// Returns whether it died. Entities without `Health` are unaffected.
    ///
    /// # Panics
    ///
    /// Panics if the entity was removed.
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> bool {
        assert!(self.is_alive(id), "cannot damage removed entity {id}");
        let Some(health) = self.component_mut::<Health>(id) else {
            return false;
        };
        health.add_damage(amount.max(0.0));
        let dead = self.current_health(id).is_some_and(|current| current <= 0.0);
        if dead {
            tracing::debug!(entity = %id, "destroyed");
            self.kill(id);
        }
        dead
    }

    /// Restore up to `amount` health; returns how much was restored.
    ///
    /// # Panics
    ///
    /// Panics if the entity was removed.
    pub fn heal(&mut self, id: EntityId, amount: f32) -> f32 {
        assert!(self.is_alive(id), "cannot heal removed entity {id}");
        self.component_mut::<Health>(id)
            .map_or(0.0, |health| health.restore(amount))
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    fn queue_mut(&mut self, id: EntityId) -> Result<&mut TaskQueue, SimError> {
        let entity = self
            .entity_mut(id)
            .ok_or(SimError::StaleEntity { entity: id })?;
        entity
            .get_mut::<TaskQueue>()
            .ok_or(SimError::MissingComponent {
                entity: id,
                kind: ComponentKind::TaskQueue,
            })
    }

    /// Append a task to `id`'s queue.
    pub fn enqueue_task(&mut self, id: EntityId, task: Box<dyn Task>) -> Result<TaskHandle, SimError> {
        let handle = self.queue_mut(id)?.enqueue(task);
        self.flush_queue_change(id);
        Ok(handle)
    }

    /// Drop everything queued for `id` and start `task` instead.
    pub fn override_task(
        &mut self,
        id: EntityId,
        task: Box<dyn Task>,
    ) -> Result<TaskHandle, SimError> {
        let (handle, evicted) = self.queue_mut(id)?.override_with(task);
        self.flush_queue_change(id);
        self.dispose_tasks(evicted);
        Ok(handle)
    }

    /// Swap the current task of `id` for `task`.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn replace_task(
        &mut self,
        id: EntityId,
        task: Box<dyn Task>,
    ) -> Result<TaskHandle, SimError> {
        let (handle, previous) = self.queue_mut(id)?.replace_with(task);
        self.flush_queue_change(id);
        self.dispose_tasks(previous);
        Ok(handle)
    }

    /// Cancel the task with `handle`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownTaskHandle`] if no such task is queued.
    pub fn cancel_task(&mut self, id: EntityId, handle: TaskHandle) -> Result<(), SimError> {
        let queue = self.queue_mut(id)?;
        if !queue.contains(handle) {
            return Err(SimError::UnknownTaskHandle { entity: id, handle });
        }
        let cancelled = queue.cancel(handle);
        self.flush_queue_change(id);
        self.dispose_tasks(cancelled);
        Ok(())
    }

    /// Drop every task queued for `id`.
    pub fn clear_tasks(&mut self, id: EntityId) -> Result<(), SimError> {
        let tasks = self.queue_mut(id)?.clear();
        self.flush_queue_change(id);
        self.dispose_tasks(tasks);
        Ok(())
    }

    /// The queued task of `id` named by `handle`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownTaskHandle`] for handle 0 or a handle that is not
    /// queued (or is being updated right now).
    pub fn resolve_task(&self, id: EntityId, handle: TaskHandle) -> Result<&dyn Task, SimError> {
        let entity = self
            .entity(id)
            .ok_or(SimError::StaleEntity { entity: id })?;
        entity
            .get::<TaskQueue>()
            .and_then(|queue| queue.resolve(handle))
            .ok_or(SimError::UnknownTaskHandle { entity: id, handle })
    }

    /// Queue training of `prototype` at `trainer`.
    ///
    /// # Errors
    ///
    /// [`SimError::NotTrainable`] if the trainer does not offer the
    /// prototype (or is still under construction), plus the errors of
    /// [`World::enqueue_task`].
    pub fn train(&mut self, trainer: EntityId, prototype: &str) -> Result<TaskHandle, SimError> {
        if !self.is_alive(trainer) {
            return Err(SimError::StaleEntity { entity: trainer });
        }
        let offered = self
            .component::<Trainer>(trainer)
            .is_some_and(|t| t.can_train(prototype));
        if !offered || !self.prototypes.contains(prototype) {
            return Err(SimError::NotTrainable {
                trainer,
                prototype: prototype.to_owned(),
            });
        }
        self.enqueue_task(trainer, Box::new(TrainTask::new(trainer, prototype)))
    }

    fn dispose_tasks(&mut self, tasks: impl IntoIterator<Item = Box<dyn Task>>) {
        for mut task in tasks {
            task.dispose(self);
        }
    }

    fn flush_queue_change(&mut self, id: EntityId) {
        let changed = self
            .component_mut::<TaskQueue>(id)
            .is_some_and(TaskQueue::take_changed);
        if changed {
            self.events.push(SimEvent::TaskQueueChanged { entity: id });
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain, oldest first.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every active entity by one step.
    pub fn update(&mut self, step: &SimulationStep) {
        let active: Vec<EntityId> = self
            .entities
            .iter()
            .flatten()
            .filter(|entity| entity.state() == EntityState::Active)
            .map(Entity::id)
            .collect();

        for id in active {
            let Some(kinds) = self.entity(id).map(|e| e.kinds().to_vec()) else {
                continue;
            };
            for kind in kinds {
                if self.state(id) != Some(EntityState::Active) {
                    break;
                }
                match kind {
                    ComponentKind::Health => health::update(self, id, step),
                    ComponentKind::Attacker => attacker::update(self, id, step),
                    ComponentKind::Kamikaze => kamikaze::update(self, id, step),
                    ComponentKind::Healer => healer::update(self, id, step),
                    ComponentKind::TaskQueue => queue::update(self, id, step),
                    _ => {}
                }
            }
            self.flush_queue_change(id);
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot support
    // -----------------------------------------------------------------------

    /// Rebuild a world from restored parts. Entities keep their states; the
    /// spatial index and food tokens are derived again.
    pub(crate) fn from_parts(
        config: WorldConfig,
        allocator: EntityAllocator,
        entities: Vec<Entity>,
        factions: FactionRegistry,
        prototypes: PrototypeRegistry,
    ) -> Self {
        let mut world = World::new(config);
        world.allocator = allocator;
        world.factions = factions;
        world.prototypes = prototypes;
        for entity in entities {
            let id = entity.id();
            let index = id.index() as usize;
            if world.entities.len() <= index {
                world.entities.resize_with(index + 1, || None);
            }
            let footprint = entity
                .state()
                .is_in_world()
                .then(|| entity.get::<Spatial>().map(|s| (s.grid_region(), s.collision_layer())))
                .flatten();
            world.entities[index] = Some(entity);
            if let Some((region, layer)) = footprint {
                world.spatial.add(id, region, layer);
            }
            world.acquire_food_token(id);
        }
        world
    }

    /// Move the factions and prototypes out, leaving empty registries.
    pub(crate) fn take_registries(&mut self) -> (FactionRegistry, PrototypeRegistry) {
        (
            std::mem::take(&mut self.factions),
            std::mem::take(&mut self.prototypes),
        )
    }

    /// Check internal tables agree with each other.
    pub fn is_consistent(&self) -> bool {
        if !self.allocator.is_consistent() || !self.spatial.is_consistent() {
            return false;
        }
        let live = self.entities.iter().flatten().count();
        if live != self.allocator.alive_count() {
            return false;
        }
        self.entities.iter().flatten().all(|entity| {
            let indexed = entity.state().is_in_world() && entity.has(ComponentKind::Spatial);
            self.spatial.contains(entity.id()) == indexed
                && self.allocator.is_alive(entity.id())
        })
    }
}

/// `Cost::PRODUCTION_TIME` from a prototype's components.
fn production_time(prototype: &str, components: &[Component]) -> Result<f32, SimError> {
    components
        .iter()
        .find_map(|component| match component {
            Component::Cost(cost) => cost.base_stat(Cost::PRODUCTION_TIME),
            _ => None,
        })
        .map(StatValue::to_f32)
        .ok_or_else(|| SimError::MalformedPrototype {
            name: prototype.to_owned(),
            details: "has no Cost, so it cannot be produced".to_owned(),
        })
}
