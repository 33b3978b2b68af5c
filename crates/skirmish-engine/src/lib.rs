//! Skirmish engine -- lockstep match driver for the skirmish simulation.
//!
//! Builds on [`skirmish_core`] with a fixed-timestep [`TickLoop`](tick::TickLoop)
//! that applies player commands at the start of every tick, BLAKE3-hashed
//! snapshots for desync detection, replay recording and verification, and
//! JSON scenario loading.
//!
//! # Quick Start
//!
//! ```
//! use skirmish_engine::prelude::*;
//!
//! let scenario = ScenarioConfig::from_json_str(r#"{
//!     "factions": [{ "name": "red" }],
//!     "prototypes": {
//!         "scout": [
//!             { "Spatial": { "size": [1, 1], "collision_layer": "Ground" } },
//!             { "Mobile": { "speed": 4.0 } },
//!             { "TaskQueue": {} }
//!         ]
//!     },
//!     "entities": [{ "prototype": "scout", "position": [0.0, 0.0], "faction": 0 }]
//! }"#).unwrap();
//! let mut tick_loop = scenario.build().unwrap();
//! let scout = tick_loop.world().entity_ids()[0];
//!
//! tick_loop.submit(IssuedCommand::new(
//!     FactionId(0),
//!     PlayerCommand::Move { units: vec![scout], destination: glam::Vec2::new(5.5, 0.5), queued: false },
//! ));
//! tick_loop.run_ticks(100);
//! assert_eq!(tick_loop.tick_count(), 100);
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod replay;
pub mod snapshot;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the simulation crate for convenience.
pub use skirmish_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use skirmish_core::prelude::*;

    pub use crate::command::{CommandError, IssuedCommand, PlayerCommand};
    pub use crate::config::{FactionConfig, ScenarioConfig, SpawnConfig};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::snapshot::EngineSnapshot;
    pub use crate::tick::{InputFrame, TickConfig, TickDiagnostics, TickLoop};
}
