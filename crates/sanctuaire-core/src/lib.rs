//! # Sanctuaire Core Library
//!
//! Core logic for Sanctuaire, a guided prayer and meditation timer. The CLI
//! binary is a thin host over this library.
//!
//! ## Architecture
//!
//! - **Session Engine**: a deadline-based state machine that walks a fixed
//!   sequence of timed steps. Commands return the side effects to perform
//!   instead of performing them.
//! - **Session Runner**: a tokio loop that ticks the engine, fires deferred
//!   advances, plays cues and holds the display guard.
//! - **Storage**: TOML configuration, SQLite key-value preferences and journal.
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: guided session state machine
//! - [`SessionRunner`]: async driver for the engine
//! - [`CuePlayer`]: fire-and-forget cue playback
//! - [`DisplayGuard`]: keep-the-screen-awake capability
//! - [`Config`] / [`Preferences`]: deployment settings and user preferences

pub mod cue;
pub mod display;
pub mod error;
pub mod events;
pub mod readings;
pub mod session;
pub mod storage;

pub use cue::{CommandCuePlayer, CueKind, CuePlayer, SilentCuePlayer, TerminalBell};
pub use display::{DisplayGuard, InhibitGuard, NoopGuard};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use session::{
    CompletionReason, Phase, SessionCommand, SessionConfig, SessionEngine, SessionObserver,
    SessionRunner, SessionState, Step, StepDefinition, StepSequence, SystemClock,
};
pub use storage::{Config, Database, JournalEntry, KeyValueStore, MemoryStore, Preferences};
