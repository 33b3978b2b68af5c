//! Tasks: actions an entity carries out over several ticks.
//!
//! A task is owned by the [`TaskQueue`](queue::TaskQueue) of the entity it is
//! bound to. It never holds references into the world; it keeps
//! [`EntityId`]s and resolves them through the [`World`] on each update.

pub mod attack;
pub mod movement;
pub mod queue;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::step::SimulationStep;
use crate::world::World;

pub use attack::AttackTask;
pub use movement::MoveTask;
pub use queue::TaskQueue;

/// One action of an entity.
pub trait Task: fmt::Debug {
    /// The entity executing this task.
    fn entity(&self) -> EntityId;

    /// Short human-readable label, e.g. `"move"`.
    fn description(&self) -> String;

    /// Advance the task by one tick. Only the head task of a queue is updated.
    fn update(&mut self, world: &mut World, step: &SimulationStep);

    /// Whether the task is finished and can be discarded.
    fn has_ended(&self) -> bool;

    /// Release anything the task acquired. Called exactly once, after the
    /// task has left its queue. The owning entity may already be gone.
    fn dispose(&mut self, _world: &mut World) {}
}

/// Externally addressable identity of a queued task.
///
/// Handles are assigned per queue, starting at 1 and increasing with every
/// enqueue. [`TaskHandle::NONE`] (0) never names a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u32);

impl TaskHandle {
    /// Reserved: "no task".
    pub const NONE: TaskHandle = TaskHandle(0);

    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
