//! Construction and training.
//!
//! An entity being produced carries a progress component
//! ([`BuildProgress`](build::BuildProgress) or
//! [`TrainProgress`](train::TrainProgress)). Its active behaviours (attacks,
//! production, its task queue...) are hidden inside the progress component
//! until work completes. Health starts at 1 and rises linearly to the full
//! maximum as work is done.
//!
//! Completion swaps the progress component for the hidden components inside
//! a single borrow of the entity, so no other update can observe a
//! half-finished entity.

pub mod build;
pub mod train;

use serde::{Deserialize, Serialize};

use crate::combat::Health;
use crate::component::{Component, ComponentData, ComponentKind};
use crate::entity::EntityId;
use crate::world::World;

pub use build::{BuildProgress, BuildTask, Builder};
pub use train::{TrainProgress, TrainTask, Trainer};

/// Component kinds withheld from an entity until it is finished.
pub const HIDDEN_KINDS: &[ComponentKind] = &[
    ComponentKind::Attacker,
    ComponentKind::Kamikaze,
    ComponentKind::Healer,
    ComponentKind::Builder,
    ComponentKind::Trainer,
    ComponentKind::TaskQueue,
];

/// Work done against work required, plus the withheld components.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductionState {
    required_time: f32,
    #[serde(default)]
    elapsed: f32,
    #[serde(default)]
    hidden: Vec<Component>,
}

impl ProductionState {
    pub fn new(required_time: f32, hidden: Vec<Component>) -> Self {
        Self {
            required_time,
            elapsed: 0.0,
            hidden,
        }
    }

    pub fn required_time(&self) -> f32 {
        self.required_time
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Fraction of work done, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.required_time <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.required_time).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.required_time
    }

    /// Kinds of the withheld components.
    pub fn hidden_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.hidden.iter().map(Component::kind)
    }

    /// Add `work` seconds; returns the progress fraction gained.
    fn advance(&mut self, work: f32) -> f32 {
        let before = self.progress();
        self.elapsed = (self.elapsed + work.max(0.0)).min(self.required_time);
        self.progress() - before
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.required_time > 0.0 && self.required_time.is_finite()) {
            return Err(format!(
                "required time must be positive, got {}",
                self.required_time
            ));
        }
        if !(self.elapsed >= 0.0) {
            return Err(format!("elapsed time must be non-negative, got {}", self.elapsed));
        }
        for component in &self.hidden {
            if !HIDDEN_KINDS.contains(&component.kind()) {
                return Err(format!("{} cannot be hidden", component.kind()));
            }
            component.validate()?;
        }
        Ok(())
    }
}

/// A component tracking production of its entity.
pub trait Production: ComponentData {
    fn state(&self) -> &ProductionState;
    fn state_mut(&mut self) -> &mut ProductionState;
    fn into_state(component: Component) -> Option<ProductionState>;
}

/// Split `components` into those visible during production and those
/// withheld until it completes.
pub(crate) fn conceal(components: Vec<Component>) -> (Vec<Component>, Vec<Component>) {
    components
        .into_iter()
        .partition(|component| !HIDDEN_KINDS.contains(&component.kind()))
}

/// Put a freshly created entity at 1 hit point.
pub(crate) fn start_at_one_health(world: &mut World, entity: EntityId) {
    let Some(max) = world.stat_f32(entity, Health::MAX_HEALTH) else {
        return;
    };
    if let Some(health) = world.component_mut::<Health>(entity) {
        health.set_damage(max - 1.0);
    }
}

/// Advance production of `entity` by `work` seconds.
///
/// Returns `Some(true)` when this call completed production (the progress
/// component is gone and the hidden components are attached), `Some(false)`
/// while work remains, and `None` if the entity is not being produced.
pub(crate) fn advance<P: Production>(world: &mut World, entity: EntityId, work: f32) -> Option<bool> {
    let max_health = world.stat_f32(entity, Health::MAX_HEALTH);
    let target = world.entity_mut(entity)?;

    let gained = target.get_mut::<P>()?.state_mut().advance(work);
    if let (Some(max), Some(health)) = (max_health, target.get_mut::<Health>()) {
        health.restore(gained * (max - 1.0).max(0.0));
    }
    if !target.get::<P>()?.state().is_complete() {
        return Some(false);
    }

    let state = target.remove_component(P::KIND).and_then(P::into_state)?;
    for component in state.hidden {
        target.add_component(component);
    }
    Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Attacker;
    use crate::component::Mobile;
    use crate::task::TaskQueue;

    #[test]
    fn conceal_withholds_behaviour() {
        let (visible, hidden) = conceal(vec![
            Mobile::new(1.0).into(),
            Attacker::new(3, 0.0, 1.0).into(),
            TaskQueue::new().into(),
        ]);
        let visible: Vec<_> = visible.iter().map(Component::kind).collect();
        let hidden: Vec<_> = hidden.iter().map(Component::kind).collect();
        assert_eq!(visible, vec![ComponentKind::Mobile]);
        assert_eq!(hidden, vec![ComponentKind::Attacker, ComponentKind::TaskQueue]);
    }

    #[test]
    fn progress_saturates() {
        let mut state = ProductionState::new(4.0, Vec::new());
        assert_eq!(state.advance(1.0), 0.25);
        assert_eq!(state.advance(10.0), 0.75);
        assert!(state.is_complete());
        assert_eq!(state.elapsed(), 4.0);
        assert_eq!(state.advance(1.0), 0.0);
    }
}
