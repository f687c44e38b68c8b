use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sanctuaire", version, about = "Guided prayer timer")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the guided session
    Session(commands::session::SessionArgs),
    /// Run a single free-form timer
    Free {
        /// Timer length in minutes
        #[arg(long, default_value = "15")]
        minutes: u64,
        /// Timer length in seconds (overrides --minutes)
        #[arg(long)]
        seconds: Option<u64>,
        #[command(flatten)]
        session: commands::session::SessionArgs,
    },
    /// List the steps of the guided session
    Steps {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Step durations and cue preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Journal notes
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a random reading
    Reading {
        /// Print the welcome verse instead
        #[arg(long)]
        welcome: bool,
    },
    /// Play cues with the configured player
    Cue(commands::cue::CueArgs),
}

/// Initialize logging on stderr; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "sanctuaire={level},sanctuaire_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Session(args) => commands::session::run_guided(args),
        Commands::Free {
            minutes,
            seconds,
            session,
        } => commands::session::run_free(seconds.unwrap_or(minutes.saturating_mul(60)), session),
        Commands::Steps { json } => commands::steps::run(json),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reading { welcome } => commands::steps::reading(welcome),
        Commands::Cue(args) => commands::cue::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
