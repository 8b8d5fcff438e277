//! Command handlers for the trigger CLI

use std::future::Future;
use std::io::{self, BufRead};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use trigger_ble::PlatformAdvertiser;
use trigger_core::ModeKind;

use crate::app::{AppCommand, BeaconApp};
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::Result;

const COMMAND_QUEUE_DEPTH: usize = 16;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        let radio = PlatformAdvertiser::new(config.cli.dry_run, config.cli.adapter.clone());
        info!("Using {} advertising backend", radio.backend_name());

        let mut app = BeaconApp::new(radio, StdRng::from_entropy(), &config)?;

        match cli.command.mode() {
            Some((kind, duration_secs)) => {
                Self::handle_mode_command(&mut app, kind, duration_secs).await
            }
            None => Self::handle_interactive_command(&mut app).await,
        }
    }

    /// Run one mode until Ctrl+C or the requested duration elapses
    async fn handle_mode_command(
        app: &mut BeaconApp<PlatformAdvertiser, StdRng>,
        kind: ModeKind,
        duration_secs: Option<u64>,
    ) -> Result<()> {
        let entered = app.enter(kind).await;
        app.flush_events()?;
        entered?;

        match duration_secs {
            Some(secs) => info!("Broadcasting in {} mode for {}s", kind, secs),
            None => info!("Broadcasting in {} mode... Press Ctrl+C to stop", kind),
        }

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let stopper = tokio::spawn(async move {
            match duration_secs {
                Some(secs) => {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                        _ = wait_for_interrupt(tokio::signal::ctrl_c()) => {}
                    }
                }
                None => wait_for_interrupt(tokio::signal::ctrl_c()).await,
            }
            let _ = tx.send(AppCommand::Quit).await;
        });

        let result = app.run(rx).await;
        stopper.abort();
        result
    }

    /// Read commands from stdin until `quit`, EOF or Ctrl+C
    async fn handle_interactive_command(
        app: &mut BeaconApp<PlatformAdvertiser, StdRng>,
    ) -> Result<()> {
        println!("Commands: burst | sweep | single | stop | status | quit");

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);

        // Blocking stdin lives on its own thread so it never holds up shutdown
        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match AppCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if stdin_tx.blocking_send(command).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
            let _ = stdin_tx.blocking_send(AppCommand::Quit);
        });

        let interrupt = tokio::spawn(async move {
            wait_for_interrupt(tokio::signal::ctrl_c()).await;
            let _ = tx.send(AppCommand::Quit).await;
        });

        let result = app.run(rx).await;
        interrupt.abort();
        result
    }
}

/// Resolve once the interrupt signal fires. A handler that cannot be
/// installed never resolves, so the caller keeps running.
async fn wait_for_interrupt(signal: impl Future<Output = io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_resolves_on_signal() {
        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for_interrupt(async { Ok::<(), io::Error>(()) }),
        )
        .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_failed_handler_never_resolves() {
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            wait_for_interrupt(async { Err(io::Error::new(io::ErrorKind::Other, "no signals")) }),
        )
        .await;
        assert!(waited.is_err());
    }
}
