//! The per-entity FIFO of tasks.
//!
//! Handles and tasks share one slot list, so the handle table and the task
//! sequence can never disagree. While the head task is being updated it is
//! taken out of its slot (the slot stays, empty); afterwards the queue is
//! re-checked by handle, because the task may have cancelled or replaced
//! itself, or overridden the whole queue, during its own update.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{Task, TaskHandle};
use crate::component::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::entity::EntityId;
use crate::step::SimulationStep;
use crate::world::World;

#[derive(Debug)]
struct TaskSlot {
    handle: TaskHandle,
    /// `None` while the task is being updated.
    task: Option<Box<dyn Task>>,
}

/// Ordered, handle-addressable list of an entity's tasks.
///
/// Queued tasks are transient: they are not serialized. The handle counter
/// is persistent so handles stay unique across a save and load.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    #[serde(skip)]
    slots: VecDeque<TaskSlot>,
    #[serde(default)]
    last_handle: u32,
    #[serde(skip)]
    owner: Option<EntityId>,
    #[serde(skip)]
    changed: bool,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the queue to the entity it was attached to.
    ///
    /// # Panics
    ///
    /// Panics if the queue is already bound to another entity.
    pub(crate) fn bind(&mut self, owner: EntityId) {
        if let Some(current) = self.owner {
            assert_eq!(
                current, owner,
                "task queue of {current} cannot move to {owner}"
            );
        }
        self.owner = Some(owner);
    }

    /// The entity this queue belongs to, once attached.
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live handles, head first.
    pub fn handles(&self) -> impl Iterator<Item = TaskHandle> + '_ {
        self.slots.iter().map(|slot| slot.handle)
    }

    /// Handle of the task at the head of the queue.
    pub fn head(&self) -> Option<TaskHandle> {
        self.slots.front().map(|slot| slot.handle)
    }

    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.position(handle).is_some()
    }

    /// Append `task` and return its handle.
    ///
    /// # Panics
    ///
    /// Panics if the queue is not attached to an entity or the task is
    /// bound to a different entity.
    pub fn enqueue(&mut self, task: Box<dyn Task>) -> TaskHandle {
        let handle = self.next_handle(&*task);
        self.slots.push_back(TaskSlot {
            handle,
            task: Some(task),
        });
        self.changed = true;
        handle
    }

    /// Evict every queued task, then enqueue `task`.
    ///
    /// Returns the new handle and the evicted tasks, which the caller must
    /// dispose. A task evicted while it is being updated is not returned; the
    /// update loop disposes it.
    pub fn override_with(&mut self, task: Box<dyn Task>) -> (TaskHandle, Vec<Box<dyn Task>>) {
        let handle = self.next_handle(&*task);
        let evicted = self.slots.drain(..).filter_map(|slot| slot.task).collect();
        self.slots.push_back(TaskSlot {
            handle,
            task: Some(task),
        });
        self.changed = true;
        (handle, evicted)
    }

    /// Substitute the head task with `task`, keeping the rest of the queue.
    ///
    /// Returns the new handle and the previous head (unless it is being
    /// updated right now).
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn replace_with(&mut self, task: Box<dyn Task>) -> (TaskHandle, Option<Box<dyn Task>>) {
        assert!(
            !self.slots.is_empty(),
            "cannot replace the head of an empty task queue"
        );
        let handle = self.next_handle(&*task);
        let previous = self.slots.pop_front().and_then(|slot| slot.task);
        self.slots.push_front(TaskSlot {
            handle,
            task: Some(task),
        });
        self.changed = true;
        (handle, previous)
    }

    /// Remove the task with `handle`, wherever it is in the queue.
    ///
    /// Returns the removed task for disposal. Returns `None` if no such task
    /// is queued, or if it is the task currently being updated (the update
    /// loop disposes it).
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<Box<dyn Task>> {
        let index = self.position(handle)?;
        self.changed = true;
        self.slots.remove(index).and_then(|slot| slot.task)
    }

    /// Remove every task, returning them for disposal.
    pub fn clear(&mut self) -> Vec<Box<dyn Task>> {
        if !self.slots.is_empty() {
            self.changed = true;
        }
        self.slots.drain(..).filter_map(|slot| slot.task).collect()
    }

    /// The handle of `task`, found by pointer identity.
    pub fn try_get_handle(&self, task: &dyn Task) -> Option<TaskHandle> {
        self.slots.iter().find_map(|slot| {
            let queued = slot.task.as_deref()?;
            std::ptr::addr_eq(queued as *const dyn Task, task as *const dyn Task)
                .then_some(slot.handle)
        })
    }

    /// The task named by `handle`. Handle 0 never resolves.
    pub fn resolve(&self, handle: TaskHandle) -> Option<&dyn Task> {
        self.slots
            .iter()
            .find(|slot| slot.handle == handle)
            .and_then(|slot| slot.task.as_deref())
    }

    /// Report and reset the "queue changed" flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn position(&self, handle: TaskHandle) -> Option<usize> {
        self.slots.iter().position(|slot| slot.handle == handle)
    }

    fn next_handle(&mut self, task: &dyn Task) -> TaskHandle {
        let owner = self
            .owner
            .unwrap_or_else(|| panic!("task queue is not attached to an entity ({task:?})"));
        assert_eq!(
            task.entity(),
            owner,
            "task {} is bound to {} but was queued on {owner}",
            task.description(),
            task.entity()
        );
        self.last_handle = self
            .last_handle
            .checked_add(1)
            .unwrap_or_else(|| panic!("task handles of {owner} exhausted"));
        TaskHandle::from_raw(self.last_handle)
    }

    /// Take the head task out of its slot for updating.
    fn take_head(&mut self) -> Option<(TaskHandle, Box<dyn Task>)> {
        let slot = self.slots.front_mut()?;
        let task = slot.task.take()?;
        Some((slot.handle, task))
    }

    /// Put an updated task back into its slot.
    fn restore(&mut self, handle: TaskHandle, task: Box<dyn Task>) {
        if let Some(index) = self.position(handle) {
            self.slots[index].task = Some(task);
        }
    }

    /// Drop the slot of a finished task.
    fn finish(&mut self, handle: TaskHandle) {
        if let Some(index) = self.position(handle) {
            self.slots.remove(index);
            self.changed = true;
        }
    }
}

impl ComponentData for TaskQueue {
    const KIND: ComponentKind = ComponentKind::TaskQueue;
    const PROPERTIES: &'static [Property] = &[
        Property::transient("tasks"),
        Property::persistent("last_handle"),
    ];

    impl_downcast!(TaskQueue);
}

/// Update the head task of `entity`'s queue.
///
/// The task runs with full access to the world. Afterwards it goes back to
/// its slot if it is still queued and has not ended; otherwise it is
/// disposed.
pub(crate) fn update(world: &mut World, entity: EntityId, step: &SimulationStep) {
    let Some((handle, mut task)) = world
        .component_mut::<TaskQueue>(entity)
        .and_then(TaskQueue::take_head)
    else {
        return;
    };

    task.update(world, step);

    if task.has_ended() {
        if let Some(queue) = world.component_mut::<TaskQueue>(entity) {
            queue.finish(handle);
        }
    } else if let Some(queue) = world.component_mut::<TaskQueue>(entity) {
        if queue.contains(handle) {
            queue.restore(handle, task);
            return;
        }
    }
    task.dispose(world);
}
