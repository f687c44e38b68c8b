//! Display-retention guard.
//!
//! While held, the guard asks the host not to blank or suspend the display.
//! Both operations are idempotent and never fail: if the host has no such
//! capability the session simply runs without it.

use std::process::Stdio;

pub trait DisplayGuard: Send {
    fn acquire(&mut self);
    fn release(&mut self);
    fn is_held(&self) -> bool;
}

/// Guard that does nothing, for hosts without the capability.
#[derive(Debug, Default)]
pub struct NoopGuard {
    held: bool,
}

impl DisplayGuard for NoopGuard {
    fn acquire(&mut self) {
        self.held = true;
    }

    fn release(&mut self) {
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

/// Holds an inhibitor process (by default `systemd-inhibit ... cat`) for as
/// long as the guard is acquired.
///
/// The inhibitor's stdin is a pipe owned by the guard. Closing it on release
/// ends the inhibited command even when the inhibitor runs it as a separate
/// child, so no descendant outlives the session.
#[derive(Debug)]
pub struct InhibitGuard {
    command: Vec<String>,
    child: Option<tokio::process::Child>,
}

impl InhibitGuard {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: None,
        }
    }

    pub fn default_command() -> Vec<String> {
        [
            "systemd-inhibit",
            "--what=idle:sleep",
            "--who=sanctuaire",
            "--why=Guided session in progress",
            "cat",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn spawn(&self) -> std::io::Result<tokio::process::Child> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty inhibit command")
        })?;
        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}

impl Default for InhibitGuard {
    fn default() -> Self {
        Self::new(Self::default_command())
    }
}

impl DisplayGuard for InhibitGuard {
    fn acquire(&mut self) {
        if self.child.is_some() {
            return;
        }
        match self.spawn() {
            Ok(child) => {
                tracing::debug!(pid = ?child.id(), "Display inhibitor acquired");
                self.child = Some(child);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Display inhibitor unavailable, continuing without it");
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            // EOF ends the inhibited command; the kill covers inhibitors that
            // ignore stdin.
            drop(child.stdin.take());
            if let Err(e) = child.start_kill() {
                tracing::warn!(error = %e, "Failed to stop display inhibitor");
            } else {
                tracing::debug!("Display inhibitor released");
            }
        }
    }

    fn is_held(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for InhibitGuard {
    fn drop(&mut self) {
        self.release();
    }
}
