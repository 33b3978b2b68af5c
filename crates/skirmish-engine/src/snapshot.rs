//! Match-level snapshot and restore with BLAKE3 hashing.
//!
//! An [`EngineSnapshot`] wraps a [`WorldSnapshot`] with the tick metadata
//! and pending input, plus a BLAKE3 digest of all of it. Lockstep peers
//! compare digests to detect desyncs.
//!
//! ```
//! use skirmish_engine::prelude::*;
//!
//! let mut tick_loop = TickLoop::new(World::new(WorldConfig::default()), TickConfig::default());
//! tick_loop.run_ticks(10);
//!
//! let snapshot = tick_loop.capture_snapshot().unwrap();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! tick_loop.run_ticks(5);
//! tick_loop.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```
//!
//! Not captured: faction and prototype registries (configuration, kept by
//! the target loop), queued tasks, pending events and diagnostics.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use skirmish_core::snapshot::WorldSnapshot;

use crate::tick::{InputFrame, TickLoop};

// ---------------------------------------------------------------------------
// EngineSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of a running match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub world: WorldSnapshot,
    /// Ticks executed at capture time.
    pub tick_counter: u64,
    pub fixed_dt: f64,
    /// Input queued for the next tick at capture time.
    pub current_input: InputFrame,
    /// BLAKE3 hex digest (64 lowercase chars) of the fields above.
    pub hash: String,
}

impl EngineSnapshot {
    /// Recompute the digest and compare it with the recorded one.
    pub fn verify(&self) -> anyhow::Result<bool> {
        let hash = compute_hash(
            &self.world,
            self.tick_counter,
            self.fixed_dt,
            &self.current_input,
        )?;
        Ok(hash == self.hash)
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

fn compute_hash(
    world: &WorldSnapshot,
    tick_counter: u64,
    fixed_dt: f64,
    input: &InputFrame,
) -> anyhow::Result<String> {
    #[derive(Serialize)]
    struct HashableState<'a> {
        world: &'a WorldSnapshot,
        tick_counter: u64,
        fixed_dt: f64,
        current_input: &'a InputFrame,
    }

    let bytes = serde_json::to_vec(&HashableState {
        world,
        tick_counter,
        fixed_dt,
        current_input: input,
    })
    .context("failed to serialize match state for hashing")?;

    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// TickLoop snapshot/restore methods
// ---------------------------------------------------------------------------

impl TickLoop {
    /// Capture the world, tick counter, time step and pending input.
    ///
    /// # Errors
    ///
    /// Fails if a component cannot be serialized.
    pub fn capture_snapshot(&self) -> anyhow::Result<EngineSnapshot> {
        let world = WorldSnapshot::capture(self.world()).context("failed to capture world")?;
        let tick_counter = self.tick_count();
        let fixed_dt = self.fixed_dt();
        let current_input = self.current_input().clone();
        let hash = compute_hash(&world, tick_counter, fixed_dt, &current_input)?;

        Ok(EngineSnapshot {
            world,
            tick_counter,
            fixed_dt,
            current_input,
            hash,
        })
    }

    /// Restore a previously captured snapshot.
    ///
    /// The time step and digest are checked before anything changes; if
    /// either is wrong, or the world snapshot is malformed, the loop is left
    /// as it was.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `fixed_dt`, a digest mismatch, or a world
    /// snapshot that does not describe a consistent world.
    pub fn restore_from_snapshot(&mut self, snapshot: &EngineSnapshot) -> anyhow::Result<()> {
        if !(snapshot.fixed_dt > 0.0 && snapshot.fixed_dt.is_finite()) {
            bail!(
                "snapshot has invalid fixed_dt {}; it must be positive and finite",
                snapshot.fixed_dt
            );
        }

        let expected = compute_hash(
            &snapshot.world,
            snapshot.tick_counter,
            snapshot.fixed_dt,
            &snapshot.current_input,
        )?;
        if expected != snapshot.hash {
            bail!(
                "snapshot hash mismatch: recorded {} but recomputed {expected}",
                snapshot.hash
            );
        }

        snapshot
            .world
            .restore(self.world_mut())
            .context("failed to restore world from snapshot")?;
        self.set_tick_counter(snapshot.tick_counter);
        self.set_fixed_dt(snapshot.fixed_dt);
        self.set_input(snapshot.current_input.clone());

        tracing::debug!(
            tick = snapshot.tick_counter,
            hash = snapshot.hash.as_str(),
            "match restored from snapshot"
        );
        Ok(())
    }

    /// BLAKE3 digest of the current state, as [`capture_snapshot`](Self::capture_snapshot)
    /// would record it.
    pub fn state_hash(&self) -> anyhow::Result<String> {
        let world = WorldSnapshot::capture(self.world()).context("failed to capture world")?;
        compute_hash(&world, self.tick_count(), self.fixed_dt(), self.current_input())
    }

    /// Capture a branch point. Same as [`capture_snapshot`](Self::capture_snapshot).
    pub fn fork_snapshot(&self) -> anyhow::Result<EngineSnapshot> {
        self.capture_snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::TickConfig;
    use glam::{IVec2, Vec2};
    use skirmish_core::prelude::*;

    fn walker_loop() -> (TickLoop, EntityId) {
        let mut world = World::new(WorldConfig::default());
        let unit = world.create_entity(vec![
            Spatial::new(Vec2::ZERO, IVec2::ONE, CollisionLayer::Ground).into(),
            Mobile::new(1.0).into(),
            TaskQueue::new().into(),
        ]);
        world.activate(unit);
        let tick_loop = TickLoop::new(
            world,
            TickConfig {
                fixed_dt: 0.5,
                headless: true,
            },
        );
        (tick_loop, unit)
    }

    #[test]
    fn hash_tracks_state_changes() {
        let (mut tick_loop, unit) = walker_loop();
        let before = tick_loop.state_hash().unwrap();
        assert_eq!(before, tick_loop.capture_snapshot().unwrap().hash);

        tick_loop.world_mut().set_position(unit, Vec2::new(3.0, 0.0));
        assert_ne!(tick_loop.state_hash().unwrap(), before);
    }

    #[test]
    fn tampered_snapshot_is_rejected_without_changes() {
        let (mut tick_loop, unit) = walker_loop();
        let mut snapshot = tick_loop.capture_snapshot().unwrap();
        snapshot.tick_counter += 1;
        assert!(!snapshot.verify().unwrap());

        tick_loop.world_mut().set_position(unit, Vec2::new(5.0, 0.0));
        let error = tick_loop.restore_from_snapshot(&snapshot).unwrap_err();
        assert!(error.to_string().contains("hash mismatch"));
        assert_eq!(
            tick_loop.world().component::<Spatial>(unit).unwrap().position(),
            Vec2::new(5.0, 0.0)
        );
    }

    #[test]
    fn invalid_dt_is_rejected() {
        let (mut tick_loop, _) = walker_loop();
        let mut snapshot = tick_loop.capture_snapshot().unwrap();
        snapshot.fixed_dt = f64::NAN;
        assert!(tick_loop.restore_from_snapshot(&snapshot).is_err());
        assert_eq!(tick_loop.fixed_dt(), 0.5);
    }

    #[test]
    fn snapshot_survives_json() {
        let (tick_loop, _) = walker_loop();
        let snapshot = tick_loop.capture_snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: EngineSnapshot = serde_json::from_str(&json).unwrap();
        assert!(back.verify().unwrap());
        assert_eq!(back, snapshot);
    }
}
