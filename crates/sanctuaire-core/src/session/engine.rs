//! Guided session engine.
//!
//! A deadline-driven state machine. It owns no threads and no timers: every
//! command mutates the state synchronously and returns the side effects the
//! host must carry out (play cues, hold the display, schedule or cancel the
//! deferred advance, notify observers).
//!
//! ## State Transitions
//!
//! ```text
//! Running --toggle--> Paused --toggle--> Running
//! Running --tick, deadline passed--> Interstitial --advance_due--> Running | Exited
//! Running | Paused --next--> Running | Exited
//! Running | Paused --previous--> Paused
//! * --exit--> Exited
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (mut engine, effects) = SessionEngine::start(config, SystemClock);
//! host.apply(effects);
//! // Every ~200ms:
//! host.apply(engine.tick());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::config::SessionConfig;
use super::step::Step;
use crate::cue::CueKind;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Running,
    Paused,
    /// Countdown reached zero; cues are sounding and the advance is pending.
    Interstitial,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    /// The last step's interstitial finished.
    Completed,
    /// `next` was issued on the last step.
    Skipped,
    /// The user left the session.
    Exited,
}

/// Host commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Toggle,
    Next,
    Previous,
    Exit,
}

/// Identifies one scheduled advance. Only the most recently issued token is
/// honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdvanceToken(u64);

/// Side effects requested by the engine, in the order they must be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PlayCue {
        kind: CueKind,
    },
    PlayCueSequence {
        kind: CueKind,
        count: u32,
        interval_ms: u64,
    },
    AcquireDisplay,
    ReleaseDisplay,
    /// Call `advance_due(token)` after `delay_ms`.
    ScheduleAdvance {
        token: AdvanceToken,
        delay_ms: u64,
    },
    CancelAdvance {
        token: AdvanceToken,
    },
    /// Session is over; tear down the tick source.
    StopTicker,
    Notify(Event),
}

/// Consistent snapshot of the engine, as observed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub step_index: usize,
    pub step_count: usize,
    pub step_id: String,
    pub time_left_secs: u64,
    pub running: bool,
    /// Epoch ms at which the countdown reaches zero; only while running.
    pub deadline_ms: Option<u64>,
    /// Epoch ms at which the pending advance fires; only in the interstitial.
    pub advance_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct PendingAdvance {
    token: AdvanceToken,
    fire_at_ms: u64,
}

pub struct SessionEngine<C: Clock> {
    config: SessionConfig,
    clock: C,
    phase: Phase,
    step_index: usize,
    time_left_secs: u64,
    deadline_ms: Option<u64>,
    pending: Option<PendingAdvance>,
    next_token: u64,
}

impl<C: Clock> SessionEngine<C> {
    /// Start a session on the first step, running, with the opening cue.
    pub fn start(config: SessionConfig, clock: C) -> (Self, Vec<Effect>) {
        let mut engine = Self {
            config,
            clock,
            phase: Phase::Exited,
            step_index: 0,
            time_left_secs: 0,
            deadline_ms: None,
            pending: None,
            next_token: 0,
        };

        let mut effects = vec![Effect::AcquireDisplay];
        if engine.config.opening_cue() {
            effects.push(Effect::PlayCue {
                kind: engine.config.cue_kind(),
            });
        }
        effects.extend(engine.enter_step(0, true));
        tracing::debug!(
            steps = engine.config.steps().len(),
            first_step_secs = engine.time_left_secs,
            "Session started"
        );
        (engine, effects)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.config.steps().get(self.step_index)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pending_advance(&self) -> Option<AdvanceToken> {
        self.pending.map(|p| p.token)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            step_index: self.step_index,
            step_count: self.config.steps().len(),
            step_id: self
                .current_step()
                .map(|s| s.id.clone())
                .unwrap_or_default(),
            time_left_secs: self.time_left_secs,
            running: self.is_running(),
            deadline_ms: self.deadline_ms,
            advance_at_ms: self.pending.map(|p| p.fire_at_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn handle(&mut self, command: SessionCommand) -> Vec<Effect> {
        match command {
            SessionCommand::Toggle => self.toggle(),
            SessionCommand::Next => self.next(),
            SessionCommand::Previous => self.previous(),
            SessionCommand::Exit => self.exit(),
        }
    }

    /// Recompute the remaining time from the deadline.
    ///
    /// A deadline that has already passed, however long ago, expires the step
    /// like any other: the cues still play.
    pub fn tick(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Running => {
                let now = self.clock.now_ms();
                let deadline = *self
                    .deadline_ms
                    .get_or_insert_with(|| now.saturating_add(self.time_left_secs * 1000));
                self.time_left_secs = remaining_secs(deadline, now);
                if self.time_left_secs == 0 {
                    return self.expire(now);
                }
                vec![self.notify_state()]
            }
            Phase::Paused | Phase::Interstitial => vec![self.notify_state()],
            Phase::Exited => Vec::new(),
        }
    }

    pub fn toggle(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                self.deadline_ms = None;
                tracing::debug!(
                    step_index = self.step_index,
                    time_left_secs = self.time_left_secs,
                    "Session paused"
                );
                vec![self.notify_state()]
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                self.deadline_ms = Some(self.deadline_from_now());
                tracing::debug!(
                    step_index = self.step_index,
                    time_left_secs = self.time_left_secs,
                    "Session resumed"
                );
                vec![self.notify_state()]
            }
            Phase::Interstitial | Phase::Exited => Vec::new(),
        }
    }

    /// Skip to the next step without cues, or finish on the last step.
    pub fn next(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Running | Phase::Paused => {
                if self.config.steps().is_last(self.step_index) {
                    self.finish(CompletionReason::Skipped)
                } else {
                    self.enter_step(self.step_index + 1, true)
                }
            }
            Phase::Interstitial | Phase::Exited => Vec::new(),
        }
    }

    /// Go back one step, paused. Does nothing on the first step.
    pub fn previous(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Running | Phase::Paused if self.step_index > 0 => {
                self.enter_step(self.step_index - 1, false)
            }
            _ => Vec::new(),
        }
    }

    pub fn exit(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Exited {
            return Vec::new();
        }
        self.finish(CompletionReason::Exited)
    }

    /// The deferred advance identified by `token` is due.
    ///
    /// Tokens that were cancelled or superseded are ignored.
    pub fn advance_due(&mut self, token: AdvanceToken) -> Vec<Effect> {
        if self.phase != Phase::Interstitial {
            return Vec::new();
        }
        match self.pending {
            Some(pending) if pending.token == token => {}
            _ => {
                tracing::debug!(?token, "Ignoring stale advance");
                return Vec::new();
            }
        }
        self.pending = None;

        if self.config.steps().is_last(self.step_index) {
            self.finish(CompletionReason::Completed)
        } else {
            self.enter_step(self.step_index + 1, true)
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn expire(&mut self, now: u64) -> Vec<Effect> {
        let cue_count = self.current_step().map(|s| s.cue_count).unwrap_or(0);
        let kind = self.config.cue_kind();
        let delay_ms = self.config.interstitial_ms(cue_count);

        self.phase = Phase::Interstitial;
        self.time_left_secs = 0;
        self.deadline_ms = None;

        let mut effects = self.cancel_pending();
        let token = self.issue_token();
        self.pending = Some(PendingAdvance {
            token,
            fire_at_ms: now.saturating_add(delay_ms),
        });

        tracing::debug!(
            step_index = self.step_index,
            cue_count,
            delay_ms,
            "Step expired"
        );

        if cue_count > 0 {
            effects.push(Effect::PlayCueSequence {
                kind,
                count: cue_count,
                interval_ms: self.config.cue_interval_ms(),
            });
        }
        effects.push(Effect::ScheduleAdvance { token, delay_ms });
        effects.push(Effect::Notify(Event::StepExpired {
            step_index: self.step_index,
            cue_count,
            cue_kind: kind,
            advance_in_ms: delay_ms,
            at: self.timestamp(),
        }));
        effects.push(self.notify_state());
        effects
    }

    fn enter_step(&mut self, index: usize, running: bool) -> Vec<Effect> {
        let mut effects = self.cancel_pending();
        self.step_index = index;
        self.time_left_secs = self
            .config
            .steps()
            .get(index)
            .map(|s| s.duration_secs)
            .unwrap_or(0);
        if running {
            self.phase = Phase::Running;
            self.deadline_ms = Some(self.deadline_from_now());
        } else {
            self.phase = Phase::Paused;
            self.deadline_ms = None;
        }
        tracing::debug!(
            step_index = index,
            time_left_secs = self.time_left_secs,
            running,
            "Entered step"
        );
        effects.push(self.notify_state());
        effects
    }

    /// Single teardown path for every way a session can end.
    fn finish(&mut self, reason: CompletionReason) -> Vec<Effect> {
        let mut effects = self.cancel_pending();
        self.phase = Phase::Exited;
        self.deadline_ms = None;
        tracing::debug!(step_index = self.step_index, ?reason, "Session finished");

        effects.push(Effect::StopTicker);
        effects.push(Effect::ReleaseDisplay);
        effects.push(self.notify_state());
        effects.push(Effect::Notify(Event::SessionCompleted {
            reason,
            step_index: self.step_index,
            at: self.timestamp(),
        }));
        effects
    }

    fn cancel_pending(&mut self) -> Vec<Effect> {
        self.pending
            .take()
            .map(|p| Effect::CancelAdvance { token: p.token })
            .into_iter()
            .collect()
    }

    fn issue_token(&mut self) -> AdvanceToken {
        self.next_token += 1;
        AdvanceToken(self.next_token)
    }

    fn deadline_from_now(&self) -> u64 {
        self.clock
            .now_ms()
            .saturating_add(self.time_left_secs.saturating_mul(1000))
    }

    fn notify_state(&self) -> Effect {
        Effect::Notify(Event::StateChanged {
            state: self.state(),
            at: self.timestamp(),
        })
    }

    fn timestamp(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms() as i64).unwrap_or_default()
    }
}

/// Whole seconds left until `deadline`, rounded up, never negative.
fn remaining_secs(deadline_ms: u64, now_ms: u64) -> u64 {
    deadline_ms.saturating_sub(now_ms).div_ceil(1000)
}
