use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use input_replay_core::{
    native_injector, DryRunInjector, EventLog, InputInjector, ReplayConfig, Replayer,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> input_replay_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            log,
            config,
            dry_run,
            speed,
            report,
        } => run_replay(&log, config.as_deref(), dry_run, speed, report.as_deref()).await,
        Commands::Inspect { log, config } => run_inspect(&log, config.as_deref()).await,
    }
}

async fn run_replay(
    log: &Path,
    config: Option<&Path>,
    dry_run: bool,
    speed: Option<f64>,
    report_path: Option<&Path>,
) -> input_replay_core::Result<()> {
    let mut config = load_config(config)?;
    if let Some(speed) = speed {
        config.playback.speed = speed;
        config.validate()?;
    }
    tracing::info!(?log, dry_run, speed = config.playback.speed, "replaying event log");

    let injector: Box<dyn InputInjector + Send> = if dry_run {
        Box::new(DryRunInjector)
    } else {
        native_injector()
    };
    let mut replayer = Replayer::new(injector, config);

    let cancel = replayer.cancel_handle();
    let report = {
        let replay = replayer.replay_file(log);
        tokio::pin!(replay);
        tokio::select! {
            report = &mut replay => report,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted, stopping replay");
                cancel.cancel();
                replay.await
            }
        }
    };

    println!(
        "injected {} / failed {} / skipped {} events{}",
        report.injected(),
        report.failed(),
        report.skipped(),
        if report.cancelled { " (cancelled)" } else { "" }
    );

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| input_replay_core::ReplayError::msg(err.to_string()))?;
        std::fs::write(path, json)?;
    }
    Ok(())
}

async fn run_inspect(log: &Path, config: Option<&Path>) -> input_replay_core::Result<()> {
    let config = load_config(config)?;
    let parsed = EventLog::load(log, &config.log).await;

    for record in &parsed.records {
        println!("{:>6}  {}", record.line, record.to_row(config.log.delimiter));
    }
    if !parsed.skipped_lines.is_empty() {
        println!("skipped short rows on lines {:?}", parsed.skipped_lines);
    }
    if let Some(err) = &parsed.aborted {
        println!("parsing stopped: {err}");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> input_replay_core::Result<ReplayConfig> {
    match path {
        Some(path) => ReplayConfig::from_toml_file(path),
        None => Ok(ReplayConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays recorded keyboard and mouse events", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay an event log against the system input.
    Replay {
        /// Path to the recorded event log.
        log: PathBuf,
        /// Optional TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Log each event instead of injecting it.
        #[arg(long)]
        dry_run: bool,
        /// Playback speed multiplier; 2.0 halves every gap.
        #[arg(long)]
        speed: Option<f64>,
        /// Write the replay report as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Parse an event log and print the records it contains.
    Inspect {
        /// Path to the recorded event log.
        log: PathBuf,
        /// Optional TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
