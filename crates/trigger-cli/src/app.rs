//! Host event loop driving the broadcast controller

use std::time::Duration;

use rand::RngCore;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use trigger_core::{
    BroadcastController, BroadcastEvent, ModeKind, RadioAdvertiser, RadioError, SessionSnapshot,
};

use crate::config::AppConfig;
use crate::display::StatusRenderer;
use crate::error::{CliError, Result};

/// Requests from the user side of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Enter(ModeKind),
    Exit,
    Status,
    Quit,
}

impl AppCommand {
    /// Parse one line of interactive input. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let command = match line.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "burst" | "b" => AppCommand::Enter(ModeKind::Burst),
            "sweep" | "s" => AppCommand::Enter(ModeKind::Sweep),
            "single" | "1" => AppCommand::Enter(ModeKind::Single),
            "stop" | "exit" | "x" => AppCommand::Exit,
            "status" | "?" => AppCommand::Status,
            "quit" | "q" => AppCommand::Quit,
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Owns the controller, its event stream and the tick timer
pub struct BeaconApp<A, R>
where
    A: RadioAdvertiser,
    R: RngCore + Send,
{
    controller: BroadcastController<A, R, mpsc::UnboundedSender<BroadcastEvent>>,
    events: mpsc::UnboundedReceiver<BroadcastEvent>,
    renderer: StatusRenderer,
    timer: Option<Interval>,
}

impl<A, R> BeaconApp<A, R>
where
    A: RadioAdvertiser,
    R: RngCore + Send,
{
    pub fn new(radio: A, rng: R, config: &AppConfig) -> Result<Self> {
        let (event_tx, events) = mpsc::unbounded_channel();
        let controller = BroadcastController::new(radio, rng, event_tx, config.broadcast.clone())?;

        Ok(Self {
            controller,
            events,
            renderer: StatusRenderer::new(config.cli.json_output),
            timer: None,
        })
    }

    /// Enter a mode and arm the tick timer for it
    pub async fn enter(&mut self, kind: ModeKind) -> std::result::Result<(), RadioError> {
        self.timer = None;
        let result = self.controller.enter_mode(kind).await;
        if let Some(period) = self.controller.timer_period() {
            self.timer = Some(arm_timer(period));
        }
        result
    }

    /// Disarm the timer, then release the radio
    pub async fn exit(&mut self) {
        self.timer = None;
        self.controller.exit_mode().await;
    }

    /// Apply one command. Returns `false` once the app should stop.
    pub async fn handle_command(&mut self, command: AppCommand) -> Result<bool> {
        debug!("Handling command {:?}", command);
        match command {
            AppCommand::Enter(kind) => {
                if let Err(err) = self.enter(kind).await {
                    warn!("{} mode not started: {}", kind, err);
                }
            }
            AppCommand::Exit => self.exit().await,
            AppCommand::Status => {
                let line = self.renderer.render_snapshot(&self.controller.session())?;
                println!("{}", line);
            }
            AppCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Run until a `Quit` arrives or every command sender is gone
    pub async fn run(&mut self, mut commands: mpsc::Receiver<AppCommand>) -> Result<()> {
        self.flush_events()?;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    if !self.handle_command(command).await? {
                        break;
                    }
                }
                _ = next_tick(&mut self.timer) => {
                    self.controller.tick().await;
                }
            }
            self.flush_events()?;
        }

        self.exit().await;
        self.flush_events()?;
        info!(
            "Shut down after {} transmissions",
            self.controller.session().total_transmissions
        );
        Ok(())
    }

    /// Print every pending controller event
    pub fn flush_events(&mut self) -> Result<()> {
        for event in self.drain_events() {
            println!("{}", self.renderer.render_event(&event)?);
        }
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<BroadcastEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub fn session(&self) -> SessionSnapshot {
        self.controller.session()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn radio(&self) -> &A {
        self.controller.radio()
    }
}

/// First tick one period from now; late ticks are pushed back, not bunched
fn arm_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) -> Instant {
    match timer {
        Some(timer) => timer.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use trigger_core::{MockRadio, Mode};

    fn app_with(radio: MockRadio, config: AppConfig) -> BeaconApp<MockRadio, ChaCha8Rng> {
        BeaconApp::new(radio, ChaCha8Rng::seed_from_u64(7), &config).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            AppCommand::parse(" Burst ").unwrap(),
            Some(AppCommand::Enter(ModeKind::Burst))
        );
        assert_eq!(AppCommand::parse("x").unwrap(), Some(AppCommand::Exit));
        assert_eq!(AppCommand::parse("q").unwrap(), Some(AppCommand::Quit));
        assert_eq!(AppCommand::parse("   ").unwrap(), None);
        assert!(matches!(
            AppCommand::parse("warp"),
            Err(CliError::UnknownCommand(cmd)) if cmd == "warp"
        ));
    }

    #[tokio::test]
    async fn test_single_mode_arms_no_timer() {
        let mut app = app_with(MockRadio::new(), AppConfig::default());
        app.enter(ModeKind::Single).await.unwrap();

        assert!(!app.is_timer_armed());
        assert_eq!(app.session().mode, Mode::Single);
        assert_eq!(app.radio().start_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_activation_leaves_timer_disarmed() {
        let mut radio = MockRadio::new();
        radio.fail_all_starts(true);
        let mut app = app_with(radio, AppConfig::default());

        assert!(app.enter(ModeKind::Burst).await.is_err());
        assert!(!app.is_timer_armed());
        assert!(matches!(
            app.drain_events().as_slice(),
            [BroadcastEvent::ActivationFailed { mode: ModeKind::Burst, .. }]
        ));
    }

    #[tokio::test]
    async fn test_exit_disarms_timer() {
        let mut app = app_with(MockRadio::new(), AppConfig::default());
        app.enter(ModeKind::Sweep).await.unwrap();
        assert!(app.is_timer_armed());

        assert!(app.handle_command(AppCommand::Exit).await.unwrap());
        assert!(!app.is_timer_armed());
        assert!(!app.session().is_active);
    }

    #[tokio::test]
    async fn test_run_ticks_until_quit() {
        let mut config = AppConfig::default();
        config.broadcast = config.broadcast.with_sweep_interval(Duration::from_millis(5));
        let mut app = app_with(MockRadio::new(), config);

        let (tx, rx) = mpsc::channel(4);
        let driver = async move {
            tx.send(AppCommand::Enter(ModeKind::Sweep)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(AppCommand::Quit).await.unwrap();
        };

        let (result, ()) = tokio::join!(app.run(rx), driver);
        result.unwrap();

        // Activation plus at least one timer tick, then torn down on quit
        assert!(app.radio().start_count() >= 2);
        assert!(!app.session().is_active);
        assert!(!app.is_timer_armed());
    }

    #[tokio::test]
    async fn test_run_stops_when_senders_drop() {
        let mut app = app_with(MockRadio::new(), AppConfig::default());
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        app.run(rx).await.unwrap();
        assert!(!app.session().is_active);
    }
}
