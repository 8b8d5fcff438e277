//! Observer contract between the controller and the presentation layer
//!
//! The core only defines what an event carries. Rendering, indicator LEDs
//! and any other presentation are the receiver's concern.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::mode::ModeKind;
use crate::payload::FuzzValue;

// ----------------------------------------------------------------------------
// Event Types
// ----------------------------------------------------------------------------

/// Which payload variant a transmission carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Original,
    Fuzzed(FuzzValue),
}

impl PayloadKind {
    pub fn fuzz_value(&self) -> FuzzValue {
        match self {
            PayloadKind::Original => FuzzValue::ZERO,
            PayloadKind::Fuzzed(value) => *value,
        }
    }
}

/// Counters after one transmission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub total_transmissions: u64,
    pub payload: PayloadKind,
    pub last_attempt_succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// The mode's first transmission succeeded and its timer (if any) is armed
    Activated { mode: ModeKind, report: TickReport },
    /// The first transmission failed; the controller is back to idle
    ActivationFailed { mode: ModeKind, error: String },
    /// A timer tick finished
    Tick(TickReport),
    /// The user left an active mode
    Deactivated {
        mode: ModeKind,
        total_transmissions: u64,
    },
}

// ----------------------------------------------------------------------------
// Observer Trait
// ----------------------------------------------------------------------------

/// Receives controller events. Called inline on the controller's context, so
/// implementations must not block.
pub trait BroadcastObserver {
    fn on_event(&mut self, event: &BroadcastEvent);
}

/// Discards every event
impl BroadcastObserver for () {
    fn on_event(&mut self, _event: &BroadcastEvent) {}
}

impl BroadcastObserver for mpsc::UnboundedSender<BroadcastEvent> {
    fn on_event(&mut self, event: &BroadcastEvent) {
        if self.send(event.clone()).is_err() {
            trace!("Event receiver dropped, discarding {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = BroadcastEvent::Tick(TickReport {
            total_transmissions: 3,
            payload: PayloadKind::Fuzzed(FuzzValue::new(0x0102)),
            last_attempt_succeeded: true,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tick");
        assert_eq!(json["total_transmissions"], 3);
        assert_eq!(json["payload"]["fuzzed"], 0x0102);
    }

    #[test]
    fn test_channel_observer_survives_dropped_receiver() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.on_event(&BroadcastEvent::Deactivated {
            mode: ModeKind::Single,
            total_transmissions: 1,
        });
    }
}
