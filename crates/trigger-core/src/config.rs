//! Broadcast configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::AddressMode;
use crate::error::{Result, TriggerError};
use crate::radio::{ChannelMap, PowerLevel};

/// Shortest legal BLE advertising interval
pub const MIN_ADV_INTERVAL_MS: u16 = 20;

/// Longest legacy advertising interval (10.24 s plus the 245 ms slack)
pub const MAX_ADV_INTERVAL_MS: u16 = 10_485;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Timing, radio and addressing settings for the broadcast controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Tick period of the cyclic burst mode
    pub burst_interval_ms: u64,
    /// Fuzzed payloads sent after each original payload in burst mode
    pub burst_size: u32,
    /// Tick period of the monotonic sweep mode
    pub sweep_interval_ms: u64,
    /// Lower bound of the radio's advertising interval
    pub adv_min_interval_ms: u16,
    /// Upper bound of the radio's advertising interval
    pub adv_max_interval_ms: u16,
    pub channel_map: ChannelMap,
    pub power_level: PowerLevel,
    pub burst_address: AddressMode,
    pub sweep_address: AddressMode,
    pub single_address: AddressMode,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            burst_interval_ms: 100,
            burst_size: 10,
            sweep_interval_ms: 500,
            adv_min_interval_ms: 50,
            adv_max_interval_ms: 50,
            channel_map: ChannelMap::ALL,
            power_level: PowerLevel::Plus6dBm,
            burst_address: AddressMode::vendor(),
            sweep_address: AddressMode::FullyRandom,
            single_address: AddressMode::vendor(),
        }
    }
}

impl BroadcastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_burst_interval(mut self, interval: Duration) -> Self {
        self.burst_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_burst_size(mut self, size: u32) -> Self {
        self.burst_size = size;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set both advertising interval bounds
    pub fn with_adv_interval_ms(mut self, min: u16, max: u16) -> Self {
        self.adv_min_interval_ms = min;
        self.adv_max_interval_ms = max;
        self
    }

    pub fn with_power_level(mut self, level: PowerLevel) -> Self {
        self.power_level = level;
        self
    }

    pub fn with_channel_map(mut self, map: ChannelMap) -> Self {
        self.channel_map = map;
        self
    }

    pub fn with_burst_address(mut self, mode: AddressMode) -> Self {
        self.burst_address = mode;
        self
    }

    pub fn with_sweep_address(mut self, mode: AddressMode) -> Self {
        self.sweep_address = mode;
        self
    }

    pub fn with_single_address(mut self, mode: AddressMode) -> Self {
        self.single_address = mode;
        self
    }

    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.burst_interval_ms == 0 {
            return Err(TriggerError::invalid_config("burst_interval_ms must be non-zero"));
        }
        if self.sweep_interval_ms == 0 {
            return Err(TriggerError::invalid_config("sweep_interval_ms must be non-zero"));
        }
        if self.burst_size == 0 {
            return Err(TriggerError::invalid_config("burst_size must be at least 1"));
        }
        if self.adv_min_interval_ms > self.adv_max_interval_ms {
            return Err(TriggerError::invalid_config(format!(
                "advertising interval min ({} ms) exceeds max ({} ms)",
                self.adv_min_interval_ms, self.adv_max_interval_ms
            )));
        }
        for value in [self.adv_min_interval_ms, self.adv_max_interval_ms] {
            if !(MIN_ADV_INTERVAL_MS..=MAX_ADV_INTERVAL_MS).contains(&value) {
                return Err(TriggerError::invalid_config(format!(
                    "advertising interval {} ms outside {}..={} ms",
                    value, MIN_ADV_INTERVAL_MS, MAX_ADV_INTERVAL_MS
                )));
            }
        }
        if !self.channel_map.is_valid() {
            return Err(TriggerError::invalid_config(format!(
                "channel map {:#05b} enables no primary channel",
                self.channel_map.bits()
            )));
        }
        Ok(())
    }
}
