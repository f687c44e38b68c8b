use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sanctuaire_core::cue::play_bells_sequence;
use sanctuaire_core::{CommandCuePlayer, Config, CueKind, CuePlayer, Database, Preferences};

#[derive(Args, Debug)]
pub struct CueArgs {
    /// bell, bowl or gong (defaults to the saved preference)
    #[arg(long)]
    pub kind: Option<CueKind>,
    /// Number of cues to play
    #[arg(long, default_value = "1")]
    pub count: u32,
}

pub fn run(args: CueArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let prefs = Preferences::load(&db)?;
    let kind = args.kind.unwrap_or_else(|| prefs.cue_kind());
    let interval = Duration::from_millis(prefs.cue_interval_ms());

    let player: Arc<dyn CuePlayer> = Arc::new(CommandCuePlayer::new(
        config.audio.player.clone(),
        config.audio.player_args.clone(),
        config.sound_dir(),
    ));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let sequence = play_bells_sequence(player, args.count, interval, kind);
        while !sequence.is_finished() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        // Let the last sound play out before the process exits.
        tokio::time::sleep(Duration::from_millis(config.session.trailing_margin_ms)).await;
    });

    println!("played {} × {kind}", args.count);
    Ok(())
}
