//! Match recording and replay verification.
//!
//! A [`ReplayRecorder`] stores the non-empty input frames of a match and a
//! state digest every few ticks. [`replay`] feeds the frames back into a
//! [`TickLoop`] restored from the initial snapshot and reports the first
//! tick whose digest differs.
//!
//! ```
//! use skirmish_engine::prelude::*;
//! use skirmish_engine::replay::{replay, ReplayRecorder};
//!
//! let mut tick_loop = TickLoop::new(World::new(WorldConfig::default()), TickConfig::default());
//! let mut recorder = ReplayRecorder::new(tick_loop.capture_snapshot().unwrap(), 10);
//! for _ in 0..30 {
//!     recorder.record(&tick_loop).unwrap();
//!     tick_loop.tick();
//! }
//! let log = recorder.finish();
//!
//! let mut other = TickLoop::new(World::new(WorldConfig::default()), TickConfig::default());
//! let result = replay(&mut other, &log).unwrap();
//! assert!(result.completed);
//! assert_eq!(result.ticks_replayed, 30);
//! ```

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

use crate::snapshot::EngineSnapshot;
use crate::tick::{InputFrame, TickLoop};

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// Initial snapshot plus the inputs and checkpoints recorded after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub initial_snapshot: EngineSnapshot,
    /// Number of ticks to run from the snapshot, whatever the entries hold.
    pub total_ticks: u64,
    pub entries: Vec<ReplayEntry>,
}

/// An input frame or a state digest, tagged with the tick it belongs to.
///
/// Checkpoints are taken after the tick's input is set and before the tick
/// runs, so the digest covers the pending input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    Input { tick: u64, input: InputFrame },
    Checkpoint { tick: u64, state_hash: String },
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// `false` when replay stopped at a divergence.
    pub completed: bool,
    pub ticks_replayed: u64,
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint whose digest did not match during replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Builds a [`ReplayLog`] one tick at a time.
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many ticks; 0 checkpoints whenever a digest
    /// is supplied.
    checkpoint_interval: u64,
    ticks_recorded: u64,
    last_tick: Option<u64>,
}

impl ReplayRecorder {
    pub fn new(snapshot: EngineSnapshot, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            ticks_recorded: 0,
            last_tick: None,
        }
    }

    fn wants_checkpoint(&self, tick: u64) -> bool {
        self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0
    }

    /// Record one tick. Call it before the tick executes.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is not strictly greater than the previous one.
    pub fn record_tick(&mut self, tick: u64, input: &InputFrame, state_hash: Option<String>) {
        if let Some(previous) = self.last_tick {
            assert!(
                tick > previous,
                "ticks must be recorded in increasing order: {tick} after {previous}"
            );
        }
        self.last_tick = Some(tick);
        self.ticks_recorded += 1;

        if !input.is_empty() {
            self.log.entries.push(ReplayEntry::Input {
                tick,
                input: input.clone(),
            });
        }
        if let Some(state_hash) = state_hash {
            if self.wants_checkpoint(tick) {
                self.log
                    .entries
                    .push(ReplayEntry::Checkpoint { tick, state_hash });
            }
        }
    }

    /// Record the tick `tick_loop` is about to run, hashing it only when a
    /// checkpoint is due.
    ///
    /// # Errors
    ///
    /// Fails if the state cannot be hashed.
    pub fn record(&mut self, tick_loop: &TickLoop) -> anyhow::Result<()> {
        let tick = tick_loop.tick_count();
        let hash = if self.wants_checkpoint(tick) {
            Some(tick_loop.state_hash()?)
        } else {
            None
        };
        self.record_tick(tick, tick_loop.current_input(), hash);
        Ok(())
    }

    pub fn finish(mut self) -> ReplayLog {
        self.log.total_ticks = self.ticks_recorded;
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Restore `log`'s initial snapshot into `tick_loop` and run it forward,
/// comparing every checkpoint.
///
/// Replay stops at the first mismatching checkpoint.
///
/// # Errors
///
/// Fails on duplicate entries for a tick, a tick range past `u64::MAX`, or
/// a snapshot that cannot be restored. The log is validated before
/// `tick_loop` is touched.
pub fn replay(tick_loop: &mut TickLoop, log: &ReplayLog) -> anyhow::Result<ReplayResult> {
    let mut inputs: BTreeMap<u64, &InputFrame> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();
    for entry in &log.entries {
        match entry {
            ReplayEntry::Input { tick, input } => {
                if inputs.insert(*tick, input).is_some() {
                    bail!("replay log contains duplicate Input entry at tick {tick}");
                }
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                if checkpoints.insert(*tick, state_hash).is_some() {
                    bail!("replay log contains duplicate Checkpoint entry at tick {tick}");
                }
            }
        }
    }

    let start = log.initial_snapshot.tick_counter;
    let end = start.checked_add(log.total_ticks).ok_or_else(|| {
        anyhow!(
            "tick range overflow: {start} + {} exceeds u64::MAX",
            log.total_ticks
        )
    })?;

    tick_loop
        .restore_from_snapshot(&log.initial_snapshot)
        .context("failed to restore initial snapshot for replay")?;

    let mut ticks_replayed = 0;
    for tick in start..end {
        tick_loop.set_input(inputs.get(&tick).map(|&input| input.clone()).unwrap_or_default());

        if let Some(&expected) = checkpoints.get(&tick) {
            let actual = tick_loop.state_hash()?;
            if actual != expected {
                tracing::warn!(tick, expected, actual = actual.as_str(), "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: expected.to_owned(),
                        actual_hash: actual,
                    }),
                });
            }
        }

        tick_loop.tick();
        ticks_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
