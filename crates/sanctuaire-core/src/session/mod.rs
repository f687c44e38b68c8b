mod clock;
mod config;
mod engine;
mod runner;
mod step;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use config::{
    clamp_cue_interval_ms, SessionConfig, DEFAULT_CUE_INTERVAL_MS, DEFAULT_TICK_INTERVAL_MS,
    DEFAULT_TRAILING_MARGIN_MS, MAX_CUE_INTERVAL_MS, MIN_CUE_INTERVAL_MS,
};
pub use engine::{
    AdvanceToken, CompletionReason, Effect, Phase, SessionCommand, SessionEngine, SessionState,
};
pub use runner::{SessionObserver, SessionRunner};
pub use step::{default_steps, DisplayMode, Step, StepDefinition, StepSequence, READING_STEP_ID};
