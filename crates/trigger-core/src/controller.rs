//! Broadcast controller
//!
//! Owns the radio port, the random source, the payload buffer and the
//! counters for one embedding context. The host calls [`enter_mode`] and
//! [`exit_mode`] for user commands and [`tick`] at [`timer_period`] while a
//! timer is armed. Ticks must arrive serially; the controller never runs two
//! transmissions at once.
//!
//! [`enter_mode`]: BroadcastController::enter_mode
//! [`exit_mode`]: BroadcastController::exit_mode
//! [`tick`]: BroadcastController::tick
//! [`timer_period`]: BroadcastController::timer_period

use std::time::Duration;

use rand::{Rng, RngCore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::address::AddressGenerator;
use crate::config::BroadcastConfig;
use crate::error::{RadioError, Result};
use crate::mode::{Mode, ModeEvent, ModeKind};
use crate::observer::{BroadcastEvent, BroadcastObserver, PayloadKind, TickReport};
use crate::payload::{FuzzValue, ServiceData, SERVICE_DATA_LEN};
use crate::protocol::frame_service_data;
use crate::radio::{self, AddressType, BeaconConfig, RadioAdvertiser};

// ----------------------------------------------------------------------------
// Session Snapshot
// ----------------------------------------------------------------------------

/// Point-in-time view of the broadcast session for observers and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_active: bool,
    pub mode: Mode,
    pub cycle_position: u32,
    pub total_transmissions: u64,
    pub current_fuzz_value: FuzzValue,
    pub current_payload: [u8; SERVICE_DATA_LEN],
}

// ----------------------------------------------------------------------------
// Broadcast Controller
// ----------------------------------------------------------------------------

pub struct BroadcastController<A, R, O> {
    radio: A,
    addresses: AddressGenerator<R>,
    observer: O,
    config: BroadcastConfig,
    mode: Mode,
    payload: ServiceData,
    total_transmissions: u64,
    current_fuzz: FuzzValue,
    /// Period of the armed tick timer
    timer: Option<Duration>,
}

impl<A, R, O> BroadcastController<A, R, O>
where
    A: RadioAdvertiser,
    R: RngCore + Send,
    O: BroadcastObserver + Send,
{
    pub fn new(radio: A, rng: R, observer: O, config: BroadcastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            radio,
            addresses: AddressGenerator::new(rng),
            observer,
            config,
            mode: Mode::Idle,
            payload: ServiceData::new(),
            total_transmissions: 0,
            current_fuzz: FuzzValue::ZERO,
            timer: None,
        })
    }

    /// Activate a mode, tearing down any active one first.
    ///
    /// The first transmission happens immediately. If it fails the controller
    /// stays idle, no timer is armed and observers get `ActivationFailed`.
    pub async fn enter_mode(&mut self, kind: ModeKind) -> core::result::Result<(), RadioError> {
        if self.mode.is_active() {
            self.exit_mode().await;
        }

        self.total_transmissions = 0;
        let payload = match kind {
            ModeKind::Burst | ModeKind::Single => {
                self.payload.reset_to_base();
                PayloadKind::Original
            }
            ModeKind::Sweep => {
                self.payload.apply_fuzz(FuzzValue::ZERO);
                PayloadKind::Fuzzed(FuzzValue::ZERO)
            }
        };
        self.current_fuzz = payload.fuzz_value();

        match self.transmit_current(kind).await {
            Ok(()) => {
                self.mode = self.mode.transition(ModeEvent::Activated(kind));
                self.timer = kind.timer_period(&self.config);
                info!("Entered {} mode", kind);

                let report = self.report(payload, true);
                self.observer
                    .on_event(&BroadcastEvent::Activated { mode: kind, report });
                Ok(())
            }
            Err(err) => {
                error!("Could not start {} mode: {}", kind, err);
                self.timer = None;
                self.radio.stop().await;
                self.mode = self.mode.transition(ModeEvent::Deactivated);
                self.payload.reset_to_base();

                self.observer.on_event(&BroadcastEvent::ActivationFailed {
                    mode: kind,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Leave the active mode. Disarms the timer before releasing the radio,
    /// and stops the radio even when no mode is active.
    pub async fn exit_mode(&mut self) {
        self.timer = None;
        self.radio.stop().await;

        let previous = self.mode.kind();
        self.mode = self.mode.transition(ModeEvent::Deactivated);
        self.payload.reset_to_base();

        match previous {
            Some(kind) => {
                info!(
                    "Left {} mode after {} transmissions",
                    kind, self.total_transmissions
                );
                self.observer.on_event(&BroadcastEvent::Deactivated {
                    mode: kind,
                    total_transmissions: self.total_transmissions,
                });
            }
            None => debug!("Exit requested with no active mode"),
        }
    }

    /// Run one timer step. Returns `None` when no timed mode is active.
    ///
    /// A failed transmission is reported but leaves the mode and timer
    /// running; the next tick tries again with a new address and payload.
    pub async fn tick(&mut self) -> Option<TickReport> {
        let kind = self.mode.kind()?;
        let payload = match &self.mode {
            Mode::Burst(state) if state.sends_original() => {
                self.payload.reset_to_base();
                PayloadKind::Original
            }
            Mode::Burst(_) => {
                let fuzz = FuzzValue::new(self.addresses.rng_mut().gen());
                self.payload.apply_fuzz(fuzz);
                PayloadKind::Fuzzed(fuzz)
            }
            Mode::Sweep(state) => {
                let fuzz = state.upcoming();
                self.payload.apply_fuzz(fuzz);
                PayloadKind::Fuzzed(fuzz)
            }
            Mode::Idle | Mode::Single => return None,
        };
        self.current_fuzz = payload.fuzz_value();

        let succeeded = match self.transmit_current(kind).await {
            Ok(()) => true,
            Err(err) => {
                warn!("{} tick transmission failed: {}", kind, err);
                false
            }
        };

        self.mode = self.mode.transition(ModeEvent::Stepped {
            burst_size: self.config.burst_size,
        });

        let report = self.report(payload, succeeded);
        self.observer.on_event(&BroadcastEvent::Tick(report.clone()));
        Some(report)
    }

    /// Period of the armed tick timer, `None` when no timer is running
    pub fn timer_period(&self) -> Option<Duration> {
        self.timer
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_active: self.mode.is_active(),
            mode: self.mode,
            cycle_position: self.mode.cycle_position(),
            total_transmissions: self.total_transmissions,
            current_fuzz_value: self.current_fuzz,
            current_payload: *self.payload.as_bytes(),
        }
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    pub fn radio(&self) -> &A {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut A {
        &mut self.radio
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Send the current payload with a freshly drawn address
    async fn transmit_current(&mut self, kind: ModeKind) -> core::result::Result<(), RadioError> {
        let address = self.addresses.next_address(kind.address_mode(&self.config));
        let beacon = BeaconConfig {
            address,
            min_interval_ms: self.config.adv_min_interval_ms,
            max_interval_ms: self.config.adv_max_interval_ms,
            channel_map: self.config.channel_map,
            power_level: self.config.power_level,
            address_type: AddressType::Random,
        };
        let data = frame_service_data(&self.payload);

        radio::transmit(&mut self.radio, &beacon, &data).await?;
        self.total_transmissions += 1;

        debug!(
            "TX #{}: MAC={} Fuzz={}",
            self.total_transmissions, address, self.current_fuzz
        );
        Ok(())
    }

    fn report(&self, payload: PayloadKind, succeeded: bool) -> TickReport {
        TickReport {
            total_transmissions: self.total_transmissions,
            payload,
            last_attempt_succeeded: succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tokio::sync::mpsc;

    use super::*;
    use crate::payload::BASE_SERVICE_DATA;
    use crate::radio::{MockRadio, RadioCall};

    type TestController =
        BroadcastController<MockRadio, ChaCha8Rng, mpsc::UnboundedSender<BroadcastEvent>>;

    fn controller(radio: MockRadio) -> (TestController, mpsc::UnboundedReceiver<BroadcastEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = BroadcastController::new(
            radio,
            ChaCha8Rng::seed_from_u64(42),
            tx,
            BroadcastConfig::default(),
        )
        .unwrap();
        (controller, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<BroadcastEvent>) -> Vec<BroadcastEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_burst_activation_sends_original_and_arms_timer() {
        let (mut ctl, mut rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Burst).await.unwrap();

        let session = ctl.session();
        assert!(session.is_active);
        assert_eq!(session.cycle_position, 1);
        assert_eq!(session.total_transmissions, 1);
        assert_eq!(ctl.timer_period(), Some(Duration::from_millis(100)));

        let sent = ctl.radio().data_writes().next().unwrap().to_vec();
        assert_eq!(&sent[4..], &BASE_SERVICE_DATA);

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [BroadcastEvent::Activated {
                mode: ModeKind::Burst,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_burst_ticks_cycle_original_then_fuzzed() {
        let (mut ctl, _rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Burst).await.unwrap();

        let mut kinds = Vec::new();
        for _ in 0..22 {
            let report = ctl.tick().await.unwrap();
            kinds.push(matches!(report.payload, PayloadKind::Original));
        }
        // Positions 1..=10 fuzzed, 0 original, 1..=10 fuzzed, 0 original
        let originals: Vec<usize> = kinds
            .iter()
            .enumerate()
            .filter(|(_, original)| **original)
            .map(|(index, _)| index)
            .collect();
        assert_eq!(originals, vec![10, 21]);
        assert_eq!(ctl.session().total_transmissions, 23);

        // Every original tick carries the untouched template
        let writes: Vec<Vec<u8>> = ctl.radio().data_writes().map(|d| d.to_vec()).collect();
        for index in [0, 11, 22] {
            assert_eq!(&writes[index][4..], &BASE_SERVICE_DATA);
        }
    }

    #[tokio::test]
    async fn test_burst_uses_vendor_prefix() {
        let (mut ctl, _rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Burst).await.unwrap();
        for _ in 0..5 {
            ctl.tick().await;
        }
        let configs: Vec<&BeaconConfig> = ctl.radio().configs().collect();
        assert_eq!(configs.len(), 6);
        for config in &configs {
            assert!(config.address.has_prefix(&crate::address::VENDOR_PREFIX));
            assert_eq!(config.min_interval_ms, 50);
            assert_eq!(config.address_type, AddressType::Random);
        }
    }

    #[tokio::test]
    async fn test_activation_failure_reverts_to_idle() {
        let mut radio = MockRadio::new();
        radio.script_start([true]);
        let (mut ctl, mut rx) = controller(radio);

        let err = ctl.enter_mode(ModeKind::Burst).await.unwrap_err();
        assert!(matches!(err, RadioError::StartFailed { .. }));
        assert!(!ctl.is_active());
        assert_eq!(ctl.timer_period(), None);
        assert!(!ctl.radio().is_advertising());
        assert!(ctl.tick().await.is_none());

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [BroadcastEvent::ActivationFailed {
                mode: ModeKind::Burst,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn test_mid_cycle_failure_keeps_running() {
        let (mut ctl, _rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Sweep).await.unwrap();

        ctl.radio_mut().script_data([true]);
        let failed = ctl.tick().await.unwrap();
        assert!(!failed.last_attempt_succeeded);
        assert_eq!(failed.total_transmissions, 1);
        assert!(ctl.is_active());
        assert!(ctl.timer_period().is_some());

        let next = ctl.tick().await.unwrap();
        assert!(next.last_attempt_succeeded);
        assert_eq!(next.total_transmissions, 2);
        assert_eq!(next.payload, PayloadKind::Fuzzed(FuzzValue::new(2)));
    }

    #[tokio::test]
    async fn test_sweep_restarts_radio_each_tick() {
        let (mut ctl, _rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Sweep).await.unwrap();
        ctl.radio_mut().clear_calls();

        ctl.tick().await.unwrap();
        let calls = ctl.radio().calls();
        assert_eq!(calls.first(), Some(&RadioCall::Stop));
        assert_eq!(calls.last(), Some(&RadioCall::Start));
        assert_eq!(ctl.session().current_fuzz_value, FuzzValue::new(1));
    }

    #[tokio::test]
    async fn test_single_mode_has_no_timer() {
        let (mut ctl, mut rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Single).await.unwrap();

        assert!(ctl.is_active());
        assert_eq!(ctl.timer_period(), None);
        assert!(ctl.tick().await.is_none());
        assert!(ctl.radio().is_advertising());

        ctl.exit_mode().await;
        assert!(!ctl.radio().is_advertising());
        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(BroadcastEvent::Deactivated {
                mode: ModeKind::Single,
                total_transmissions: 1,
            })
        ));
    }

    #[tokio::test]
    async fn test_exit_when_idle_stops_radio() {
        let (mut ctl, mut rx) = controller(MockRadio::new());
        ctl.exit_mode().await;
        ctl.exit_mode().await;

        assert_eq!(ctl.radio().calls(), &[RadioCall::Stop, RadioCall::Stop]);
        assert!(!ctl.radio().is_advertising());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_entering_new_mode_tears_down_previous() {
        let (mut ctl, mut rx) = controller(MockRadio::new());
        ctl.enter_mode(ModeKind::Burst).await.unwrap();
        ctl.tick().await;
        ctl.enter_mode(ModeKind::Sweep).await.unwrap();

        assert_eq!(ctl.mode().kind(), Some(ModeKind::Sweep));
        assert_eq!(ctl.session().total_transmissions, 1);
        assert_eq!(ctl.timer_period(), Some(Duration::from_millis(500)));

        let events = drain(&mut rx);
        assert!(events.iter().any(|event| matches!(
            event,
            BroadcastEvent::Deactivated {
                mode: ModeKind::Burst,
                total_transmissions: 2,
            }
        )));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = BroadcastController::new(
            MockRadio::new(),
            ChaCha8Rng::seed_from_u64(1),
            (),
            BroadcastConfig::default().with_burst_size(0),
        );
        assert!(result.is_err());
    }
}
