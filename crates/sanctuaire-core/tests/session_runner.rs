//! Session runner scenarios on virtual time.
//!
//! Every test runs with tokio's clock paused, so timers fire at their exact
//! deadlines and the observed offsets are deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sanctuaire_core::session::TokioClock;
use sanctuaire_core::{
    CompletionReason, CueKind, CuePlayer, DisplayGuard, Phase, SessionCommand, SessionConfig,
    SessionObserver, SessionRunner, SessionState, Step, StepSequence,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Clone)]
struct CueLog {
    origin: Instant,
    plays: Arc<Mutex<Vec<u128>>>,
}

impl CueLog {
    fn new(origin: Instant) -> Self {
        Self {
            origin,
            plays: Arc::default(),
        }
    }

    fn offsets(&self) -> Vec<u128> {
        self.plays.lock().unwrap().clone()
    }
}

impl CuePlayer for CueLog {
    fn play_once(&self, _kind: CueKind) {
        let at = self.origin.elapsed().as_millis();
        self.plays.lock().unwrap().push(at);
    }
}

#[derive(Clone, Default)]
struct GuardLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl DisplayGuard for GuardLog {
    fn acquire(&mut self) {
        self.calls.lock().unwrap().push("acquire");
    }

    fn release(&mut self) {
        self.calls.lock().unwrap().push("release");
    }

    fn is_held(&self) -> bool {
        self.calls.lock().unwrap().last() == Some(&"acquire")
    }
}

struct Recorder {
    origin: Instant,
    states: Vec<(u128, SessionState)>,
    completions: Vec<(u128, CompletionReason)>,
}

impl Recorder {
    fn new(origin: Instant) -> Self {
        Self {
            origin,
            states: Vec::new(),
            completions: Vec::new(),
        }
    }

    /// First observed state entering `step_index` while running.
    fn step_entry(&self, step_index: usize) -> Option<&(u128, SessionState)> {
        self.states
            .iter()
            .find(|(_, s)| s.step_index == step_index && s.phase == Phase::Running)
    }
}

impl SessionObserver for Recorder {
    fn on_state_change(&mut self, state: &SessionState) {
        self.states
            .push((self.origin.elapsed().as_millis(), state.clone()));
    }

    fn on_session_complete(&mut self, reason: CompletionReason) {
        self.completions
            .push((self.origin.elapsed().as_millis(), reason));
    }
}

fn sequence(spec: &[(&str, u64, u32)]) -> StepSequence {
    StepSequence::new(
        spec.iter()
            .map(|(id, secs, cues)| Step {
                id: (*id).into(),
                title: (*id).into(),
                content: String::new(),
                duration_secs: *secs,
                cue_count: *cues,
            })
            .collect(),
    )
    .unwrap()
}

fn runner(
    spec: &[(&str, u64, u32)],
    cues: &CueLog,
    guard: &GuardLog,
) -> SessionRunner<TokioClock> {
    let config = SessionConfig::new(sequence(spec)).with_cue_interval_ms(100);
    SessionRunner::new(
        config,
        TokioClock::new(),
        Arc::new(cues.clone()),
        Box::new(guard.clone()),
    )
}

#[tokio::test(start_paused = true)]
async fn two_step_session_end_to_end() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let guard = GuardLog::default();
    let mut recorder = Recorder::new(origin);
    let (_tx, rx) = mpsc::channel(8);

    let reason = runner(&[("a", 2, 2), ("b", 2, 1)], &cues, &guard)
        .run(rx, &mut recorder)
        .await;

    assert_eq!(reason, CompletionReason::Completed);
    // Opening cue, two cues at the end of `a`, one at the end of `b`.
    assert_eq!(cues.offsets(), vec![0, 2_000, 2_100, 5_200]);

    let (entered_b, state_b) = recorder.step_entry(1).unwrap();
    assert_eq!(*entered_b, 3_200);
    assert_eq!(state_b.step_id, "b");
    assert_eq!(state_b.time_left_secs, 2);
    assert!(state_b.running);

    assert_eq!(recorder.completions, vec![(6_300, CompletionReason::Completed)]);
    let calls = guard.calls.lock().unwrap().clone();
    assert_eq!(calls.first(), Some(&"acquire"));
    assert_eq!(calls.last(), Some(&"release"));
    assert!(!calls[1..].contains(&"acquire"));
}

#[tokio::test(start_paused = true)]
async fn countdown_is_monotonic_within_a_step() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let mut recorder = Recorder::new(origin);
    let (_tx, rx) = mpsc::channel(8);

    runner(&[("a", 5, 1)], &cues, &GuardLog::default())
        .run(rx, &mut recorder)
        .await;

    let lefts: Vec<u64> = recorder
        .states
        .iter()
        .filter(|(_, s)| s.step_index == 0)
        .map(|(_, s)| s.time_left_secs)
        .collect();
    assert_eq!(lefts.first(), Some(&5));
    assert!(lefts.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(lefts.last(), Some(&0));
    for secs in 0..=5 {
        assert!(lefts.contains(&secs), "countdown skipped {secs}");
    }
}

#[tokio::test(start_paused = true)]
async fn four_steps_complete_exactly_once() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let mut recorder = Recorder::new(origin);
    let (tx, rx) = mpsc::channel(8);

    // A stray toggle lands inside the first interstitial and must be ignored.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        let _ = tx.send(SessionCommand::Toggle).await;
    });

    let reason = runner(
        &[("a", 1, 2), ("b", 1, 3), ("c", 1, 2), ("d", 1, 1)],
        &cues,
        &GuardLog::default(),
    )
    .run(rx, &mut recorder)
    .await;

    assert_eq!(reason, CompletionReason::Completed);
    assert_eq!(recorder.completions.len(), 1);
    assert_eq!(cues.offsets().len(), 1 + 2 + 3 + 2 + 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.completions.len(), 1);
    assert_eq!(cues.offsets().len(), 9);
}

#[tokio::test(start_paused = true)]
async fn exit_during_interstitial_stops_everything() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let guard = GuardLog::default();
    let mut recorder = Recorder::new(origin);
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        let _ = tx.send(SessionCommand::Exit).await;
    });

    let config = SessionConfig::new(sequence(&[("a", 1, 3), ("b", 1, 1)]))
        .with_cue_interval_ms(500);
    let reason = SessionRunner::new(
        config,
        TokioClock::new(),
        Arc::new(cues.clone()),
        Box::new(guard.clone()),
    )
    .run(rx, &mut recorder)
    .await;

    assert_eq!(reason, CompletionReason::Exited);
    let seen_states = recorder.states.len();
    assert!(recorder.step_entry(1).is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(recorder.states.len(), seen_states);
    assert_eq!(recorder.completions, vec![(1_050, CompletionReason::Exited)]);
    // Opening cue and the first end-of-step cue; the rest were cancelled.
    assert_eq!(cues.offsets(), vec![0, 1_000]);
    assert_eq!(guard.calls.lock().unwrap().last(), Some(&"release"));
}

#[tokio::test(start_paused = true)]
async fn pause_holds_remaining_time() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let mut recorder = Recorder::new(origin);
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let _ = tx.send(SessionCommand::Toggle).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        let _ = tx.send(SessionCommand::Toggle).await;
    });

    runner(&[("a", 3, 1)], &cues, &GuardLog::default())
        .run(rx, &mut recorder)
        .await;

    // 1.5s ran before the pause, leaving 2s (rounded up). Resuming at 61.5s
    // sets the deadline to 63.5s; the next tick after that, at 63.6s, expires it.
    assert_eq!(cues.offsets(), vec![0, 63_600]);
    let paused: Vec<u64> = recorder
        .states
        .iter()
        .filter(|(_, s)| s.phase == Phase::Paused)
        .map(|(_, s)| s.time_left_secs)
        .collect();
    assert!(!paused.is_empty());
    assert!(paused.iter().all(|t| *t == 2));
}

#[tokio::test(start_paused = true)]
async fn manual_navigation_through_runner() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let mut recorder = Recorder::new(origin);
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        let _ = tx.send(SessionCommand::Next).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = tx.send(SessionCommand::Previous).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = tx.send(SessionCommand::Exit).await;
    });

    let reason = runner(&[("a", 10, 2), ("b", 20, 1)], &cues, &GuardLog::default())
        .run(rx, &mut recorder)
        .await;

    assert_eq!(reason, CompletionReason::Exited);
    // Manual skips never sound the end-of-step cues.
    assert_eq!(cues.offsets(), vec![0]);

    let (at, entered_b) = recorder.step_entry(1).unwrap();
    assert_eq!(*at, 3_000);
    assert_eq!(entered_b.time_left_secs, 20);

    let back = recorder
        .states
        .iter()
        .find(|(t, s)| *t >= 3_500 && s.step_index == 0)
        .map(|(_, s)| s.clone())
        .unwrap();
    assert_eq!(back.time_left_secs, 10);
    assert!(!back.running);
}

#[tokio::test(start_paused = true)]
async fn closed_command_channel_keeps_session_alive() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let mut recorder = Recorder::new(origin);
    let (tx, rx) = mpsc::channel::<SessionCommand>(1);
    drop(tx);

    let reason = runner(&[("a", 1, 1)], &cues, &GuardLog::default())
        .run(rx, &mut recorder)
        .await;

    assert_eq!(reason, CompletionReason::Completed);
    assert_eq!(recorder.completions, vec![(2_100, CompletionReason::Completed)]);
}

#[tokio::test(start_paused = true)]
async fn runner_starts_on_first_step_running() {
    let origin = Instant::now();
    let cues = CueLog::new(origin);
    let guard = GuardLog::default();
    let runner = runner(&[("a", 4, 1), ("b", 2, 1)], &cues, &guard);

    let engine = runner.engine();
    assert_eq!(engine.phase(), Phase::Running);
    assert_eq!(engine.step_index(), 0);
    assert_eq!(engine.time_left_secs(), 4);
    assert_eq!(engine.current_step().map(|s| s.id.as_str()), Some("a"));
    assert!(engine.pending_advance().is_none());

    // Opening effects wait for `run`.
    assert!(cues.offsets().is_empty());
    assert!(guard.calls.lock().unwrap().is_empty());
}
