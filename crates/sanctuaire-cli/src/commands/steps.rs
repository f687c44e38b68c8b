use sanctuaire_core::readings::{random_reading, WELCOME};
use sanctuaire_core::{Config, Database, Preferences};

use super::format_duration;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let prefs = Preferences::load(&db)?;
    let session = config.session_config(&prefs)?;
    let steps = session.steps();

    if json {
        println!("{}", serde_json::to_string_pretty(steps.steps())?);
        return Ok(());
    }

    for (index, step) in steps.steps().iter().enumerate() {
        println!(
            "{}. {:<12} {:>8}  {} cue(s)  {}",
            index + 1,
            step.id,
            format_duration(step.duration_secs),
            step.cue_count,
            step.title
        );
    }
    println!("Total: {}", format_duration(steps.total_duration_secs()));
    Ok(())
}

pub fn reading(welcome: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reading = if welcome { WELCOME } else { random_reading() };
    println!("« {} »", reading.content);
    println!("  {}", reading.source);
    Ok(())
}
