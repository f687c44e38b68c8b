use clap::Subcommand;
use sanctuaire_core::{Config, CueKind, Database, Preferences, StepDefinition, ValidationError};

use super::format_duration;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show step durations and cue preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a step's duration in seconds
    Duration {
        /// Step id (see `sanctuaire steps`)
        step: String,
        /// Duration in seconds (minimum 10)
        seconds: u64,
    },
    /// Move a step's duration by steps of ten seconds
    Adjust {
        /// Step id
        step: String,
        /// Number of ten-second increments (negative to shorten)
        #[arg(allow_negative_numbers = true)]
        increments: i64,
    },
    /// Set the interval between cues, in milliseconds
    Interval {
        /// Interval in milliseconds (100-5000)
        ms: u64,
    },
    /// Set the cue sound
    Cue {
        /// bell, bowl or gong
        kind: CueKind,
    },
    /// Restore default durations
    Reset {
        /// Only reset this step
        step: Option<String>,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let definitions = config.step_definitions();
    let db = Database::open()?;
    let mut prefs = Preferences::load(&db)?;

    match action {
        SettingsAction::Show { json } => {
            if json {
                let steps: Vec<_> = definitions
                    .iter()
                    .map(|def| {
                        serde_json::json!({
                            "id": def.id,
                            "duration_secs": effective_duration(def, &prefs),
                            "default_duration_secs": def.default_duration_secs,
                        })
                    })
                    .collect();
                let out = serde_json::json!({
                    "steps": steps,
                    "cue_kind": prefs.cue_kind(),
                    "cue_interval_ms": prefs.cue_interval_ms(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for def in &definitions {
                    let secs = effective_duration(def, &prefs);
                    let marker = if prefs.duration_override(&def.id).is_some() {
                        " *"
                    } else {
                        ""
                    };
                    println!("{:<12} {}{marker}", def.id, format_duration(secs));
                }
                println!("cue:         {}", prefs.cue_kind());
                println!("interval:    {} ms", prefs.cue_interval_ms());
            }
            return Ok(());
        }
        SettingsAction::Duration { step, seconds } => {
            find_step(&definitions, &step)?;
            let stored = prefs.set_duration(&step, seconds);
            println!("{step}: {}", format_duration(stored));
        }
        SettingsAction::Adjust { step, increments } => {
            let def = find_step(&definitions, &step)?;
            let current = effective_duration(def, &prefs);
            let stored = prefs.adjust_duration(&step, current, increments);
            println!("{step}: {}", format_duration(stored));
        }
        SettingsAction::Interval { ms } => {
            let stored = prefs.set_cue_interval_ms(ms);
            println!("interval: {stored} ms");
        }
        SettingsAction::Cue { kind } => {
            prefs.set_cue_kind(kind);
            println!("cue: {kind}");
        }
        SettingsAction::Reset { step } => match step {
            Some(step) => {
                find_step(&definitions, &step)?;
                prefs.reset_duration(&step);
                println!("{step}: default duration restored");
            }
            None => {
                prefs.reset_durations();
                println!("default durations restored");
            }
        },
    }

    prefs.save(&db)?;
    Ok(())
}

fn find_step<'a>(
    definitions: &'a [StepDefinition],
    id: &str,
) -> Result<&'a StepDefinition, ValidationError> {
    definitions
        .iter()
        .find(|def| def.id == id)
        .ok_or_else(|| ValidationError::UnknownStep(id.to_string()))
}

fn effective_duration(def: &StepDefinition, prefs: &Preferences) -> u64 {
    prefs
        .duration_override(&def.id)
        .unwrap_or(def.default_duration_secs)
}
