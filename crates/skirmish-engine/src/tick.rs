//! Fixed-timestep tick loop for lockstep simulation.
//!
//! Each call to [`TickLoop::tick`]:
//!
//! 1. Applies the commands of the current [`InputFrame`] in submission order.
//!    Rejected commands are logged and skipped.
//! 2. Runs [`World::update`] with a [`SimulationStep`] of `fixed_dt`.
//! 3. Collects the events emitted during the tick and advances the counter.
//!
//! Simulation time is `tick_count * fixed_dt`, never an accumulated sum, so
//! every peer computes the same step values.
//!
//! # Example
//!
//! ```
//! use skirmish_engine::prelude::*;
//!
//! let world = World::new(WorldConfig::default());
//! let config = TickConfig { fixed_dt: 1.0 / 20.0, ..Default::default() };
//! let mut tick_loop = TickLoop::new(world, config);
//!
//! tick_loop.run_ticks(10);
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert!((tick_loop.sim_time() - 0.5).abs() < 1e-12);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use skirmish_core::event::SimEvent;
use skirmish_core::step::SimulationStep;
use skirmish_core::world::World;

use crate::command::IssuedCommand;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Headless mode: no presentation, tick as fast as possible.
    pub headless: bool,
}

impl Default for TickConfig {
    /// 20 Hz, headless off.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 20.0,
            headless: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and bookkeeping for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Total wall-clock time of the tick.
    pub total_time: Duration,
    /// Time spent applying player commands.
    pub command_apply_time: Duration,
    /// Time spent in `World::update`.
    pub update_time: Duration,
    pub commands_applied: usize,
    pub commands_rejected: usize,
    /// Events emitted during the tick.
    pub events: usize,
}

// ---------------------------------------------------------------------------
// InputFrame
// ---------------------------------------------------------------------------

/// Player commands to apply at the start of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub commands: Vec<IssuedCommand>,
}

impl InputFrame {
    pub fn new(commands: Vec<IssuedCommand>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The deterministic fixed-timestep driver of a [`World`].
///
/// Two loops built from the same world state, fed the same input frames,
/// stay bit-identical.
#[derive(Debug)]
pub struct TickLoop {
    world: World,
    tick_counter: u64,
    fixed_dt: f64,
    config: TickConfig,
    last_diagnostics: TickDiagnostics,
    /// Input for the next tick; consumed by [`tick`](Self::tick).
    current_input: InputFrame,
}

impl TickLoop {
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(world: World, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            world,
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            config,
            last_diagnostics: TickDiagnostics::default(),
            current_input: InputFrame::default(),
        }
    }

    /// Execute one tick and return the events it produced.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        let tick_start = Instant::now();
        let input = std::mem::take(&mut self.current_input);
        let tick = self.tick_counter;

        let mut applied = 0;
        let mut rejected = 0;
        for issued in &input.commands {
            match issued.apply(&mut self.world) {
                Ok(()) => applied += 1,
                Err(error) => {
                    rejected += 1;
                    tracing::warn!(
                        tick,
                        faction = %issued.faction,
                        command = ?issued.command,
                        %error,
                        "command rejected"
                    );
                }
            }
        }
        let command_apply_time = tick_start.elapsed();

        let update_start = Instant::now();
        let step = SimulationStep::new(tick, self.sim_time(), self.fixed_dt as f32);
        self.world.update(&step);
        let update_time = update_start.elapsed();

        let events = self.world.drain_events();
        self.tick_counter += 1;
        tracing::trace!(tick, events = events.len(), applied, rejected, "tick complete");

        self.last_diagnostics = TickDiagnostics {
            total_time: tick_start.elapsed(),
            command_apply_time,
            update_time,
            commands_applied: applied,
            commands_rejected: rejected,
            events: events.len(),
        };
        events
    }

    /// Run `count` ticks without input; returns the number of events.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        (0..count).map(|_| self.tick().len() as u64).sum()
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulation time in seconds at the start of the next tick.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests. During a match,
    /// go through [`set_input`](Self::set_input) so every peer sees the
    /// same mutations.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Set the input frame for the next tick.
    pub fn set_input(&mut self, input: InputFrame) {
        self.current_input = input;
    }

    /// Append a command to the next tick's input.
    pub fn submit(&mut self, command: IssuedCommand) {
        self.current_input.commands.push(command);
    }

    pub fn current_input(&self) -> &InputFrame {
        &self.current_input
    }

    pub fn is_headless(&self) -> bool {
        self.config.headless
    }

    pub(crate) fn set_tick_counter(&mut self, tick: u64) {
        self.tick_counter = tick;
    }

    pub(crate) fn set_fixed_dt(&mut self, fixed_dt: f64) {
        self.fixed_dt = fixed_dt;
        self.config.fixed_dt = fixed_dt;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
