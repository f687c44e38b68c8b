pub mod config;
pub mod cue;
pub mod journal;
pub mod session;
pub mod settings;
pub mod steps;

/// `m:ss`, as shown on the countdown.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `Xm YYs`, as shown next to a configured duration.
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {:02}s", seconds / 60, seconds % 60)
}
