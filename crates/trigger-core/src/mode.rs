//! Broadcast mode state machine
//!
//! The controller keeps exactly one [`Mode`]. Every change of mode goes
//! through [`Mode::transition`], so the rules for which events move the
//! machine are all in one place.

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::AddressMode;
use crate::config::BroadcastConfig;
use crate::payload::FuzzValue;

// ----------------------------------------------------------------------------
// Mode Kinds
// ----------------------------------------------------------------------------

/// The three operating modes a user can enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// One original payload followed by N randomly fuzzed payloads, repeating
    Burst,
    /// Fuzz value counts up by one per tick, wrapping at 16 bits
    Sweep,
    /// Original payload advertised once until exit
    Single,
}

impl ModeKind {
    /// Period of the mode's tick timer, `None` for the untimed single mode
    pub fn timer_period(self, config: &BroadcastConfig) -> Option<Duration> {
        match self {
            ModeKind::Burst => Some(config.burst_interval()),
            ModeKind::Sweep => Some(config.sweep_interval()),
            ModeKind::Single => None,
        }
    }

    pub fn address_mode(self, config: &BroadcastConfig) -> AddressMode {
        match self {
            ModeKind::Burst => config.burst_address,
            ModeKind::Sweep => config.sweep_address,
            ModeKind::Single => config.single_address,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::Burst => "burst",
            ModeKind::Sweep => "sweep",
            ModeKind::Single => "single",
        };
        f.write_str(name)
    }
}

// ----------------------------------------------------------------------------
// Mode State
// ----------------------------------------------------------------------------

/// Cyclic burst progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstState {
    /// 0 sends the original payload, 1..=N send fuzzed payloads
    pub position: u32,
}

impl BurstState {
    pub fn sends_original(&self) -> bool {
        self.position == 0
    }

    fn advance(self, burst_size: u32) -> Self {
        let position = match self.position.checked_add(1) {
            Some(next) if next <= burst_size => next,
            _ => 0,
        };
        Self { position }
    }
}

/// Monotonic sweep progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepState {
    /// Fuzz value of the most recent transmission
    pub fuzz: FuzzValue,
}

impl SweepState {
    /// Value the next tick will transmit
    pub fn upcoming(&self) -> FuzzValue {
        self.fuzz.wrapping_next()
    }
}

/// Current mode of the broadcast controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Idle,
    Burst(BurstState),
    Sweep(SweepState),
    Single,
}

/// Inputs that move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// The first transmission of a mode succeeded
    Activated(ModeKind),
    /// A timer tick finished its transmission attempt (success or not)
    Stepped { burst_size: u32 },
    /// The user left the mode, or activation failed
    Deactivated,
}

impl Mode {
    pub fn kind(&self) -> Option<ModeKind> {
        match self {
            Mode::Idle => None,
            Mode::Burst(_) => Some(ModeKind::Burst),
            Mode::Sweep(_) => Some(ModeKind::Sweep),
            Mode::Single => Some(ModeKind::Single),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Mode::Idle)
    }

    /// Unsigned position counter whose meaning depends on the mode: burst
    /// position, or the sweep's fuzz value.
    pub fn cycle_position(&self) -> u32 {
        match self {
            Mode::Burst(state) => state.position,
            Mode::Sweep(state) => u32::from(state.fuzz.get()),
            Mode::Idle | Mode::Single => 0,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Burst(_) => "Burst",
            Mode::Sweep(_) => "Sweep",
            Mode::Single => "Single",
        }
    }

    /// Apply an event and return the resulting mode.
    ///
    /// Events that do not apply to the current mode leave it unchanged.
    pub fn transition(self, event: ModeEvent) -> Mode {
        match (self, event) {
            (_, ModeEvent::Deactivated) => Mode::Idle,

            // Activation transmitted position 0 already
            (Mode::Idle, ModeEvent::Activated(ModeKind::Burst)) => {
                Mode::Burst(BurstState { position: 1 })
            }
            (Mode::Idle, ModeEvent::Activated(ModeKind::Sweep)) => Mode::Sweep(SweepState {
                fuzz: FuzzValue::ZERO,
            }),
            (Mode::Idle, ModeEvent::Activated(ModeKind::Single)) => Mode::Single,

            (Mode::Burst(state), ModeEvent::Stepped { burst_size }) => {
                Mode::Burst(state.advance(burst_size))
            }
            (Mode::Sweep(state), ModeEvent::Stepped { .. }) => Mode::Sweep(SweepState {
                fuzz: state.upcoming(),
            }),

            (mode, _) => mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_position_has_period_n_plus_one() {
        let mut mode = Mode::Idle.transition(ModeEvent::Activated(ModeKind::Burst));
        let mut positions = vec![0];
        for _ in 0..22 {
            positions.push(mode.cycle_position());
            mode = mode.transition(ModeEvent::Stepped { burst_size: 10 });
        }
        let expected: Vec<u32> = (0..=10).chain(0..=10).chain(0..1).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_burst_wraps_at_largest_burst_size() {
        let last = BurstState { position: u32::MAX };
        assert_eq!(last.advance(u32::MAX), BurstState { position: 0 });

        let before_last = BurstState {
            position: u32::MAX - 1,
        };
        assert_eq!(
            before_last.advance(u32::MAX),
            BurstState { position: u32::MAX }
        );
    }

    #[test]
    fn test_sweep_wraps_after_65536_steps() {
        let mut mode = Mode::Idle.transition(ModeEvent::Activated(ModeKind::Sweep));
        for _ in 0..65_536u32 {
            mode = mode.transition(ModeEvent::Stepped { burst_size: 10 });
        }
        assert_eq!(
            mode,
            Mode::Sweep(SweepState {
                fuzz: FuzzValue::ZERO
            })
        );
    }

    #[test]
    fn test_deactivate_from_any_mode() {
        for kind in [ModeKind::Burst, ModeKind::Sweep, ModeKind::Single] {
            let mode = Mode::Idle.transition(ModeEvent::Activated(kind));
            assert_eq!(mode.kind(), Some(kind));
            assert_eq!(mode.transition(ModeEvent::Deactivated), Mode::Idle);
        }
        assert_eq!(Mode::Idle.transition(ModeEvent::Deactivated), Mode::Idle);
    }

    #[test]
    fn test_inapplicable_events_are_ignored() {
        assert_eq!(
            Mode::Idle.transition(ModeEvent::Stepped { burst_size: 10 }),
            Mode::Idle
        );
        assert_eq!(
            Mode::Single.transition(ModeEvent::Stepped { burst_size: 10 }),
            Mode::Single
        );
        let burst = Mode::Burst(BurstState { position: 3 });
        assert_eq!(burst.transition(ModeEvent::Activated(ModeKind::Sweep)), burst);
    }

    #[test]
    fn test_single_has_no_timer() {
        let config = BroadcastConfig::default();
        assert_eq!(ModeKind::Single.timer_period(&config), None);
        assert_eq!(
            ModeKind::Burst.timer_period(&config),
            Some(Duration::from_millis(100))
        );
    }
}
