use std::io::{BufRead, Write};
use std::sync::Arc;

use clap::Args;
use sanctuaire_core::readings::random_reading;
use sanctuaire_core::session::DisplayMode;
use sanctuaire_core::{
    CommandCuePlayer, CompletionReason, Config, CuePlayer, Database, DisplayGuard, Event,
    InhibitGuard, NoopGuard, Phase, Preferences, SessionCommand, SessionConfig, SessionObserver,
    SessionRunner, SessionState, SilentCuePlayer, Step, StepSequence, SystemClock,
};
use tokio::sync::mpsc;

use super::format_clock;

const FREE_STEP_ID: &str = "libre";

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Print events as JSON lines instead of the countdown
    #[arg(long)]
    pub json: bool,
    /// Do not play cues
    #[arg(long)]
    pub silent: bool,
    /// Do not keep the display awake
    #[arg(long)]
    pub no_keep_awake: bool,
    /// Cue interval for this session, in milliseconds (100-5000)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

pub fn run_guided(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let prefs = Preferences::load(&db)?;
    let session = config.session_config(&prefs)?;
    drive(session, &config, &args)
}

pub fn run_free(seconds: u64, args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let prefs = Preferences::load(&db)?;
    let steps = StepSequence::new(vec![Step {
        id: FREE_STEP_ID.into(),
        title: "Temps libre".into(),
        content: String::new(),
        duration_secs: seconds,
        cue_count: 1,
    }])?;
    let session = config
        .apply_timings(SessionConfig::new(steps), &prefs)
        .with_opening_cue(false);
    drive(session, &config, &args)
}

fn drive(
    mut session: SessionConfig,
    config: &Config,
    args: &SessionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ms) = args.interval_ms {
        session = session.with_cue_interval_ms(ms);
    }
    let steps = session.steps().clone();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let reason = runtime.block_on(async {
        let cues: Arc<dyn CuePlayer> = if args.silent || !config.audio.enabled {
            Arc::new(SilentCuePlayer)
        } else {
            Arc::new(CommandCuePlayer::new(
                config.audio.player.clone(),
                config.audio.player_args.clone(),
                config.sound_dir(),
            ))
        };
        let guard: Box<dyn DisplayGuard> = if args.no_keep_awake || !config.display.keep_awake {
            Box::new(NoopGuard::default())
        } else {
            Box::new(InhibitGuard::new(config.display.inhibit_command.clone()))
        };

        let (tx, rx) = mpsc::channel(16);
        spawn_input_reader(tx.clone());
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(SessionCommand::Exit).await;
            }
        });

        if !args.json {
            eprintln!("[entrée] pause/reprise · n suivant · b précédent · q quitter");
        }
        let mut view = ConsoleView::new(steps, args.json);
        SessionRunner::new(session, SystemClock, cues, guard)
            .run(rx, &mut view)
            .await
    });

    tracing::debug!(?reason, "Session ended");
    Ok(())
}

/// Reads commands from stdin on a plain thread, so a pending read never
/// holds up runtime shutdown.
fn spawn_input_reader(tx: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(command) = parse_command(&line) else {
                continue;
            };
            if tx.blocking_send(command).is_err() {
                break;
            }
        }
    });
}

fn parse_command(line: &str) -> Option<SessionCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | "pause" | "play" => Some(SessionCommand::Toggle),
        "n" | "next" => Some(SessionCommand::Next),
        "b" | "back" | "prev" => Some(SessionCommand::Previous),
        "q" | "quit" | "exit" => Some(SessionCommand::Exit),
        _ => None,
    }
}

/// Overwrite the countdown line in place.
fn write_countdown<W: Write>(out: &mut W, state: &SessionState) -> std::io::Result<()> {
    let label = match state.phase {
        Phase::Running | Phase::Exited => "",
        Phase::Paused => " (pause)",
        Phase::Interstitial => " ♪",
    };
    write!(out, "\r  {}{label}        ", format_clock(state.time_left_secs))?;
    out.flush()
}

/// Renders a running session on the terminal.
struct ConsoleView {
    steps: StepSequence,
    json: bool,
    last: Option<(usize, u64, Phase)>,
}

impl ConsoleView {
    fn new(steps: StepSequence, json: bool) -> Self {
        Self {
            steps,
            json,
            last: None,
        }
    }

    /// Ticks repeat the same state several times a second; only changes are shown.
    fn is_new(&mut self, state: &SessionState) -> bool {
        let key = (state.step_index, state.time_left_secs, state.phase);
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    fn print_step_header(&self, state: &SessionState) {
        let Some(step) = self.steps.get(state.step_index) else {
            return;
        };
        println!();
        println!("[{}/{}] {}", state.step_index + 1, state.step_count, step.title);
        match step.display_mode() {
            DisplayMode::Reading => {
                let reading = random_reading();
                println!("« {} »\n  — {}", reading.content, reading.source);
            }
            DisplayMode::Text if !step.content.is_empty() => println!("{}", step.content),
            DisplayMode::Text => {}
        }
    }
}

impl SessionObserver for ConsoleView {
    fn on_state_change(&mut self, state: &SessionState) {
        if self.json {
            return;
        }
        let previous_step = self.last.map(|(index, _, _)| index);
        if !self.is_new(state) {
            return;
        }
        if previous_step != Some(state.step_index) {
            self.print_step_header(state);
        }
        if let Err(e) = write_countdown(&mut std::io::stdout(), state) {
            tracing::warn!(error = %e, "Failed to write countdown");
        }
    }

    fn on_session_complete(&mut self, reason: CompletionReason) {
        if self.json {
            return;
        }
        let message = match reason {
            CompletionReason::Completed | CompletionReason::Skipped => "Oraison terminée.",
            CompletionReason::Exited => "Session interrompue.",
        };
        println!("\n{message}");
    }

    fn on_event(&mut self, event: &Event) {
        if !self.json {
            return;
        }
        if let Event::StateChanged { state, .. } = event {
            if !self.is_new(state) {
                return;
            }
        }
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
        }
    }
}
