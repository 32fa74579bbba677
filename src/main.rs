//! mac-accessibility-check CLI
//!
//! One-shot queries print a single JSON value to stdout. `serve` speaks the
//! JSON-lines protocol on stdio for scripting runtimes that keep the process
//! alive.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use mac_accessibility_check::{
    init_logging, server, Config, LogLevel, PermissionProbe, ACCESSIBILITY_SETTINGS_URL,
};

#[derive(Parser)]
#[command(name = "mac-accessibility-check")]
#[command(about = "Check and request macOS accessibility permission")]
#[command(version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print whether this process is trusted (never prompts)
    Trusted,
    /// Print trust status, showing the system dialog if allowed
    Prompt,
    /// Print whether this process runs under the Mac App Store sandbox
    Mas,
    /// Print the full permission report
    Status,
    /// Serve JSON-lines requests on stdio
    Serve,
    /// Print the permission report every time it changes
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = Config::DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,
    },
    /// Open the Accessibility pane of System Settings
    OpenSettings,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config {
        log_level: cli.log_level,
        ..Config::default()
    };
    if let Commands::Watch { interval } = cli.command {
        config.poll_interval = Duration::from_secs(interval.max(1));
    }
    init_logging(&config);

    let probe = Arc::new(PermissionProbe::system());

    match cli.command {
        Commands::Trusted => print_json(&probe.is_trusted()?)?,
        Commands::Prompt => print_json(&probe.is_trusted_prompt()?)?,
        Commands::Mas => print_json(&probe.is_mas_environment()?)?,
        Commands::Status => print_json(&probe.get_permission_status()?)?,
        Commands::Serve => {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(());
                }
            });

            let reader = tokio::io::BufReader::new(tokio::io::stdin());
            tracing::info!("Listening on stdio");
            server::serve(probe, reader, tokio::io::stdout(), shutdown_rx).await?;
        }
        Commands::Watch { .. } => {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(());
                }
            });

            server::watch(probe, config.poll_interval, tokio::io::stdout(), shutdown_rx).await?;
        }
        Commands::OpenSettings => open_settings()?,
    }

    Ok(())
}

#[cfg(target_os = "macos")]
fn open_settings() -> Result<()> {
    let status = std::process::Command::new("open")
        .arg(ACCESSIBILITY_SETTINGS_URL)
        .status()
        .context("Failed to launch `open`")?;

    if !status.success() {
        tracing::warn!("Deep link failed, opening the Security pane instead");
        std::process::Command::new("open")
            .arg("/System/Library/PreferencePanes/Security.prefPane")
            .status()
            .context("Failed to open Security preferences")?;
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn open_settings() -> Result<()> {
    Err(mac_accessibility_check::ProbeError::unsupported())
        .with_context(|| format!("Cannot open {}", ACCESSIBILITY_SETTINGS_URL))
}
