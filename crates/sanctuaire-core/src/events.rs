use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::CueKind;
use crate::session::{CompletionReason, SessionState};

/// Notifications the session engine hands to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted after every tick and every transition.
    StateChanged {
        state: SessionState,
        at: DateTime<Utc>,
    },
    /// A step ran out and its cues were scheduled.
    StepExpired {
        step_index: usize,
        cue_count: u32,
        cue_kind: CueKind,
        advance_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// Emitted exactly once per session.
    SessionCompleted {
        reason: CompletionReason,
        step_index: usize,
        at: DateTime<Utc>,
    },
}
