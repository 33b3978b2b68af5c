//! Entity identifiers, allocation, and per-entity component storage.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. The generation is bumped
//! every time an index is recycled, which allows immediate stale-ID detection.
//!
//! An [`Entity`] stores at most one [`Component`] per [`ComponentKind`] in a
//! fixed slot array, plus the order in which components were added. That
//! order, never a hash order, drives per-tick updates and bonus summation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use crate::component::{Component, ComponentData, ComponentKind, COMPONENT_SLOTS};
use crate::faction::FactionRegistry;
use crate::stat::{Stat, StatValue};
use crate::SimError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`
///
/// Ordering compares the index first, so sorting ids yields the update order
/// of the world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index(), self.generation()).cmp(&(other.index(), other.generation()))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Free indices are kept in a FIFO queue so that generations are spread out
/// over time rather than concentrated on a hot index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAllocator {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Whether the slot is currently alive.
    alive: Vec<bool>,
    /// Free-list of recyclable indices (FIFO queue).
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`].
    ///
    /// If a recycled index is available it is reused with the generation that
    /// was bumped on deallocation; otherwise a brand-new index is created.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Deallocate an entity, incrementing the generation for that index so
    /// that any outstanding handles become stale.
    ///
    /// Returns `false` if the entity was already dead or had a stale
    /// generation.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// Returns `true` if `id` refers to a currently alive entity whose
    /// generation matches the allocator's current generation for that index.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        if idx >= self.generations.len() {
            return false;
        }
        self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Total number of currently alive entities.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Number of index slots ever handed out.
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Check the internal tables agree with each other.
    pub(crate) fn is_consistent(&self) -> bool {
        self.generations.len() == self.alive.len()
            && self.free_indices.iter().all(|&i| {
                (i as usize) < self.alive.len() && !self.alive[i as usize]
            })
    }
}

// ---------------------------------------------------------------------------
// EntityState
// ---------------------------------------------------------------------------

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Created but not yet part of the live world (e.g. a trainee).
    Inactive,
    /// Registered with the spatial index and updated every tick.
    Active,
    /// Registered with the spatial index but skipped by updates.
    Asleep,
    /// Deactivated and about to be discarded.
    Dead,
}

impl EntityState {
    /// Whether the entity occupies space in the world.
    pub fn is_in_world(self) -> bool {
        matches!(self, EntityState::Active | EntityState::Asleep)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A game object: an id plus at most one component per kind.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    state: EntityState,
    slots: [Option<Component>; COMPONENT_SLOTS],
    /// Kinds in the order they were added.
    order: Vec<ComponentKind>,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            state: EntityState::Inactive,
            slots: std::array::from_fn(|_| None),
            order: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> EntityState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    /// Attach a component.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or already carries a component of the
    /// same kind.
    pub fn add_component(&mut self, component: impl Into<Component>) {
        let mut component = component.into();
        let kind = component.kind();
        assert!(
            self.state != EntityState::Dead,
            "cannot add {kind} to dead entity {}",
            self.id
        );
        assert!(
            self.slots[kind.index()].is_none(),
            "entity {} already has a {kind} component",
            self.id
        );
        if let Component::TaskQueue(queue) = &mut component {
            queue.bind(self.id);
        }
        self.slots[kind.index()] = Some(component);
        self.order.push(kind);
    }

    /// Detach and return the component of `kind`, if present.
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        let component = self.slots[kind.index()].take()?;
        self.order.retain(|&k| k != kind);
        Some(component)
    }

    /// Whether a component of `kind` is attached.
    #[inline]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// The component of `kind`, if attached.
    #[inline]
    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.slots[kind.index()].as_ref()
    }

    /// Typed access to a component.
    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.slots[T::KIND.index()].as_ref().and_then(T::downcast)
    }

    /// Typed mutable access to a component.
    pub fn get_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        self.slots[T::KIND.index()].as_mut().and_then(T::downcast_mut)
    }

    /// Attached component kinds in registration order.
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.order
    }

    /// Attached components in registration order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.order
            .iter()
            .filter_map(move |kind| self.slots[kind.index()].as_ref())
    }

    /// Final value of `stat` for this entity.
    ///
    /// The component declaring `stat` supplies the base value; every other
    /// attached component may add a bonus.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MissingComponent`] if the declaring component is
    /// not attached.
    ///
    /// # Panics
    ///
    /// Panics if the declaring component does not know `stat`, or if a bonus
    /// has a different value kind than the base.
    pub fn get_stat_value(
        &self,
        stat: Stat,
        factions: &FactionRegistry,
    ) -> Result<StatValue, SimError> {
        let owner = stat.component();
        let declaring = self.component(owner).ok_or(SimError::MissingComponent {
            entity: self.id,
            kind: owner,
        })?;
        let mut value = declaring
            .base_stat(stat)
            .unwrap_or_else(|| panic!("{owner} does not declare stat {stat}"));

        for kind in &self.order {
            if *kind == owner {
                continue;
            }
            let bonus = self.slots[kind.index()]
                .as_ref()
                .and_then(|component| component.stat_bonus(stat, factions));
            if let Some(bonus) = bonus {
                value = value + bonus;
            }
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
