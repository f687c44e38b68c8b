use std::time::Duration;

use serde::Serialize;

use super::step::StepSequence;
use crate::cue::CueKind;

pub const MIN_CUE_INTERVAL_MS: u64 = 100;
pub const MAX_CUE_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_CUE_INTERVAL_MS: u64 = 3_500;
pub const DEFAULT_TRAILING_MARGIN_MS: u64 = 1_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

/// Clamp a cue interval into the supported range.
pub fn clamp_cue_interval_ms(ms: u64) -> u64 {
    ms.clamp(MIN_CUE_INTERVAL_MS, MAX_CUE_INTERVAL_MS)
}

/// Everything a session needs, read once when the session is built.
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    steps: StepSequence,
    cue_kind: CueKind,
    cue_interval_ms: u64,
    trailing_margin_ms: u64,
    tick_interval_ms: u64,
    opening_cue: bool,
}

impl SessionConfig {
    /// A guided session over `steps` with default timings.
    pub fn new(steps: StepSequence) -> Self {
        Self {
            steps,
            cue_kind: CueKind::default(),
            cue_interval_ms: DEFAULT_CUE_INTERVAL_MS,
            trailing_margin_ms: DEFAULT_TRAILING_MARGIN_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            opening_cue: true,
        }
    }

    pub fn with_cue_kind(mut self, kind: CueKind) -> Self {
        self.cue_kind = kind;
        self
    }

    /// Out-of-range values are clamped to [100 ms, 5 s].
    pub fn with_cue_interval_ms(mut self, ms: u64) -> Self {
        self.cue_interval_ms = clamp_cue_interval_ms(ms);
        self
    }

    pub fn with_trailing_margin_ms(mut self, ms: u64) -> Self {
        self.trailing_margin_ms = ms;
        self
    }

    /// A zero interval is raised to 1 ms.
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms.max(1);
        self
    }

    pub fn with_opening_cue(mut self, enabled: bool) -> Self {
        self.opening_cue = enabled;
        self
    }

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn cue_kind(&self) -> CueKind {
        self.cue_kind
    }

    pub fn cue_interval_ms(&self) -> u64 {
        self.cue_interval_ms
    }

    pub fn trailing_margin_ms(&self) -> u64 {
        self.trailing_margin_ms
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn opening_cue(&self) -> bool {
        self.opening_cue
    }

    /// Delay between a step's expiry and the advance: the cue run plus the
    /// trailing silence. An estimate; playback is never awaited.
    pub fn interstitial_ms(&self, cue_count: u32) -> u64 {
        u64::from(cue_count)
            .saturating_mul(self.cue_interval_ms)
            .saturating_add(self.trailing_margin_ms)
    }
}
