/// EchoHub Player - playback controller session replay
use clap::{Parser, Subcommand};
use echohub_player::{load_script, AppConfig, OutputFormat, Replay};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "echohub-player")]
#[command(about = "Replay EchoHub player sessions against the playback controller", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./echohub.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "echohub_playback=debug" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session script and print one snapshot per step
    Replay {
        /// Script file (JSON list of steps)
        script: PathBuf,

        /// Output format (overrides the configured one)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Print the controller events of each step
        #[arg(long)]
        events: bool,
    },
    /// Load and validate the configuration, then print it
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (stderr, so JSON output stays clean)
    let filter = match &cli.log {
        Some(filter) => tracing_subscriber::EnvFilter::try_new(filter)?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "echohub_player=info,echohub_playback=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay {
            script,
            format,
            events,
        } => {
            let format = format.unwrap_or(config.output.format);
            replay(&config, &script, format, events || config.output.show_events)?;
        }
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn replay(
    config: &AppConfig,
    script: &Path,
    format: OutputFormat,
    show_events: bool,
) -> anyhow::Result<()> {
    let steps = load_script(script)?;
    let mut replay = Replay::new(config.player.clone())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for frame in replay.run(&steps) {
        writeln!(out, "{}", frame.render(format, show_events)?)?;
    }

    let undelivered = replay.take_undelivered();
    if !undelivered.is_empty() {
        tracing::info!(
            count = undelivered.len(),
            "device notifications left undelivered at end of script"
        );
    }

    tracing::info!(
        "Finished in status {}",
        replay.controller().status().as_str()
    );
    Ok(())
}
