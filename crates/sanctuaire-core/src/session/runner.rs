//! Async host loop for a [`SessionEngine`].
//!
//! One task owns the engine, the tick source, the deferred advance and the
//! command channel, so every effect is applied in order and teardown happens
//! in a single place.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, Sleep};

use super::clock::Clock;
use super::config::SessionConfig;
use super::engine::{
    AdvanceToken, CompletionReason, Effect, SessionCommand, SessionEngine, SessionState,
};
use crate::cue::{play_bells_sequence, CuePlayer, CueSequence};
use crate::display::DisplayGuard;
use crate::events::Event;

/// Host callbacks.
pub trait SessionObserver {
    /// Called after every tick and transition.
    fn on_state_change(&mut self, state: &SessionState);

    /// Called once, when the session ends for any reason.
    fn on_session_complete(&mut self, reason: CompletionReason);

    /// Every event, including the ones routed to the two callbacks above.
    fn on_event(&mut self, _event: &Event) {}
}

type Deferred = Option<(AdvanceToken, Pin<Box<Sleep>>)>;

enum Wake {
    Tick,
    Advance(AdvanceToken),
    Command(Option<SessionCommand>),
}

pub struct SessionRunner<C: Clock> {
    engine: SessionEngine<C>,
    startup: Vec<Effect>,
    cues: Arc<dyn CuePlayer>,
    guard: Box<dyn DisplayGuard>,
    deferred: Deferred,
    sounding: Vec<CueSequence>,
    outcome: Option<CompletionReason>,
    stopped: bool,
}

impl<C: Clock> SessionRunner<C> {
    /// Start the engine. Its opening effects (display guard, opening cue) are
    /// applied when [`run`](Self::run) begins.
    pub fn new(
        config: SessionConfig,
        clock: C,
        cues: Arc<dyn CuePlayer>,
        guard: Box<dyn DisplayGuard>,
    ) -> Self {
        let (engine, startup) = SessionEngine::start(config, clock);
        Self {
            engine,
            startup,
            cues,
            guard,
            deferred: None,
            sounding: Vec::new(),
            outcome: None,
            stopped: false,
        }
    }

    pub fn engine(&self) -> &SessionEngine<C> {
        &self.engine
    }

    /// Drive the session until it completes or is exited.
    ///
    /// A closed command channel does not end the session; it just stops
    /// delivering commands.
    pub async fn run<O: SessionObserver>(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        observer: &mut O,
    ) -> CompletionReason {
        let startup = std::mem::take(&mut self.startup);
        self.apply(startup, observer);

        let mut ticker = tokio::time::interval(self.engine.config().tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        while !self.stopped {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Tick,
                token = deferred_due(&mut self.deferred) => Wake::Advance(token),
                command = commands.recv(), if commands_open => Wake::Command(command),
            };

            let effects = match wake {
                Wake::Tick => self.engine.tick(),
                Wake::Advance(token) => {
                    self.deferred = None;
                    self.engine.advance_due(token)
                }
                Wake::Command(Some(command)) => {
                    tracing::debug!(?command, "Session command");
                    self.engine.handle(command)
                }
                Wake::Command(None) => {
                    commands_open = false;
                    Vec::new()
                }
            };
            self.apply(effects, observer);
        }

        self.teardown();
        self.outcome.unwrap_or(CompletionReason::Exited)
    }

    fn apply<O: SessionObserver>(&mut self, effects: Vec<Effect>, observer: &mut O) {
        for effect in effects {
            match effect {
                Effect::PlayCue { kind } => self.cues.play_once(kind),
                Effect::PlayCueSequence {
                    kind,
                    count,
                    interval_ms,
                } => {
                    self.sounding.retain(|s| !s.is_finished());
                    self.sounding.push(play_bells_sequence(
                        Arc::clone(&self.cues),
                        count,
                        Duration::from_millis(interval_ms),
                        kind,
                    ));
                }
                Effect::AcquireDisplay => self.guard.acquire(),
                Effect::ReleaseDisplay => self.guard.release(),
                Effect::ScheduleAdvance { token, delay_ms } => {
                    let sleep = tokio::time::sleep(Duration::from_millis(delay_ms));
                    self.deferred = Some((token, Box::pin(sleep)));
                }
                Effect::CancelAdvance { token } => {
                    if matches!(&self.deferred, Some((pending, _)) if *pending == token) {
                        self.deferred = None;
                    }
                }
                Effect::StopTicker => self.stopped = true,
                Effect::Notify(event) => {
                    observer.on_event(&event);
                    match &event {
                        Event::StateChanged { state, .. } => observer.on_state_change(state),
                        Event::SessionCompleted { reason, .. } => {
                            self.outcome = Some(*reason);
                            observer.on_session_complete(*reason);
                        }
                        Event::StepExpired { .. } => {}
                    }
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.deferred = None;
        for sequence in self.sounding.drain(..) {
            sequence.abort();
        }
        self.guard.release();
        tracing::debug!(outcome = ?self.outcome, "Session torn down");
    }
}

async fn deferred_due(deferred: &mut Deferred) -> AdvanceToken {
    match deferred {
        Some((token, sleep)) => {
            sleep.as_mut().await;
            *token
        }
        None => pending().await,
    }
}
