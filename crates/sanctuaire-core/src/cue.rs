//! Audible cues marking step boundaries.
//!
//! Playback is fire-and-forget: `play_once` never blocks and never reports
//! failure to the caller. The session engine computes its own transition
//! delays and does not wait on anything in this module.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    #[default]
    Bell,
    Bowl,
    Gong,
}

impl CueKind {
    pub const ALL: [CueKind; 3] = [CueKind::Bell, CueKind::Bowl, CueKind::Gong];

    pub fn as_str(self) -> &'static str {
        match self {
            CueKind::Bell => "bell",
            CueKind::Bowl => "bowl",
            CueKind::Gong => "gong",
        }
    }

    /// Sound file looked up in the configured sound directory.
    pub fn file_name(self) -> String {
        format!("{}.wav", self.as_str())
    }
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CueKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bell" => Ok(CueKind::Bell),
            "bowl" => Ok(CueKind::Bowl),
            "gong" => Ok(CueKind::Gong),
            other => Err(ValidationError::InvalidValue {
                field: "cue_kind".into(),
                message: format!("unknown cue kind '{other}' (expected bell, bowl or gong)"),
            }),
        }
    }
}

/// Something that can make a cue audible.
pub trait CuePlayer: Send + Sync {
    /// Start playing one cue. Must return immediately and must not panic.
    fn play_once(&self, kind: CueKind);
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCuePlayer;

impl CuePlayer for SilentCuePlayer {
    fn play_once(&self, kind: CueKind) {
        tracing::trace!(%kind, "Cue suppressed");
    }
}

/// Synthetic cue: the terminal bell character on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play_once(&self, kind: CueKind) {
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            tracing::warn!(%kind, error = %e, "Terminal bell failed");
        }
    }
}

/// Plays sound files through an external audio player, falling back to the
/// terminal bell when the file or the player is unavailable.
#[derive(Debug, Clone)]
pub struct CommandCuePlayer {
    program: String,
    args: Vec<String>,
    sound_dir: PathBuf,
    fallback: TerminalBell,
}

impl CommandCuePlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>, sound_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            sound_dir,
            fallback: TerminalBell,
        }
    }

    fn try_spawn(&self, kind: CueKind) -> std::io::Result<()> {
        let path = self.sound_dir.join(kind.file_name());
        if !path.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("sound file {} not found", path.display()),
            ));
        }
        // The child is reaped by tokio in the background once dropped.
        tokio::runtime::Handle::try_current()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

impl CuePlayer for CommandCuePlayer {
    fn play_once(&self, kind: CueKind) {
        if let Err(e) = self.try_spawn(kind) {
            tracing::warn!(
                %kind,
                player = %self.program,
                error = %e,
                "Cue playback failed, using terminal bell"
            );
            self.fallback.play_once(kind);
        }
    }
}

/// Outstanding cues of one `play_bells_sequence` call.
#[derive(Debug, Default)]
pub struct CueSequence {
    handles: Vec<JoinHandle<()>>,
}

impl CueSequence {
    /// Cancel cues that have not sounded yet.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(|h| h.is_finished())
    }
}

/// Schedule `count` independent cues, the i-th one `i × interval` from now.
///
/// Must be called from within a tokio runtime.
pub fn play_bells_sequence(
    player: Arc<dyn CuePlayer>,
    count: u32,
    interval: Duration,
    kind: CueKind,
) -> CueSequence {
    let handles = (0..count)
        .map(|i| {
            let player = Arc::clone(&player);
            let offset = interval * i;
            tokio::spawn(async move {
                if !offset.is_zero() {
                    tokio::time::sleep(offset).await;
                }
                player.play_once(kind);
            })
        })
        .collect();
    CueSequence { handles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        plays: Mutex<Vec<(CueKind, tokio::time::Instant)>>,
    }

    impl CuePlayer for Recorder {
        fn play_once(&self, kind: CueKind) {
            self.plays
                .lock()
                .unwrap()
                .push((kind, tokio::time::Instant::now()));
        }
    }

    #[test]
    fn cue_kind_parses_case_insensitively() {
        assert_eq!("Gong".parse::<CueKind>().unwrap(), CueKind::Gong);
        assert_eq!(" bowl ".parse::<CueKind>().unwrap(), CueKind::Bowl);
        assert!("trumpet".parse::<CueKind>().is_err());
    }

    #[test]
    fn cue_kind_file_names() {
        assert_eq!(CueKind::Bell.file_name(), "bell.wav");
        assert_eq!(CueKind::default(), CueKind::Bell);
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_spaces_cues_by_interval() {
        let recorder = Arc::new(Recorder::default());
        let start = tokio::time::Instant::now();
        let seq = play_bells_sequence(
            recorder.clone(),
            3,
            Duration::from_millis(100),
            CueKind::Bowl,
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seq.is_finished());

        let plays = recorder.plays.lock().unwrap();
        let offsets: Vec<u128> = plays
            .iter()
            .map(|(_, at)| (*at - start).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 100, 200]);
        assert!(plays.iter().all(|(k, _)| *k == CueKind::Bowl));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_sequence_stops_pending_cues() {
        let recorder = Arc::new(Recorder::default());
        let seq = play_bells_sequence(recorder.clone(), 3, Duration::from_secs(1), CueKind::Bell);
        tokio::time::sleep(Duration::from_millis(10)).await;
        seq.abort();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.plays.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_sound_file_falls_back_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let player = CommandCuePlayer::new("definitely-not-a-player", vec![], dir.path().into());
        player.play_once(CueKind::Gong);
    }
}
