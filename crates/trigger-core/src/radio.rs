//! Radio advertising port
//!
//! The host supplies the radio as a [`RadioAdvertiser`]. The core only ever
//! drives it through [`transmit`], which runs the stop / configure / set data /
//! start sequence for one transmission.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::BleAddress;
use crate::error::RadioError;
use crate::protocol::MAX_LEGACY_ADV_DATA_LEN;

// ----------------------------------------------------------------------------
// Beacon Configuration
// ----------------------------------------------------------------------------

/// Primary advertising channels enabled for a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap(u8);

impl ChannelMap {
    pub const CH37: Self = Self(0b001);
    pub const CH38: Self = Self(0b010);
    pub const CH39: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// A map must enable at least one of the three primary channels
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 & !Self::ALL.0 == 0
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::ALL
    }
}

/// Advertising transmit power
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerLevel {
    #[serde(rename = "neg40dbm")]
    Neg40dBm,
    #[serde(rename = "neg20dbm")]
    Neg20dBm,
    #[serde(rename = "neg10dbm")]
    Neg10dBm,
    #[serde(rename = "neg5dbm")]
    Neg5dBm,
    #[serde(rename = "0dbm")]
    ZeroDBm,
    #[serde(rename = "plus2dbm")]
    Plus2dBm,
    #[serde(rename = "plus4dbm")]
    Plus4dBm,
    #[default]
    #[serde(rename = "plus6dbm")]
    Plus6dBm,
}

impl PowerLevel {
    pub const fn dbm(self) -> i8 {
        match self {
            PowerLevel::Neg40dBm => -40,
            PowerLevel::Neg20dBm => -20,
            PowerLevel::Neg10dBm => -10,
            PowerLevel::Neg5dBm => -5,
            PowerLevel::ZeroDBm => 0,
            PowerLevel::Plus2dBm => 2,
            PowerLevel::Plus4dBm => 4,
            PowerLevel::Plus6dBm => 6,
        }
    }
}

/// Address type announced alongside the beacon address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Public,
    #[default]
    Random,
}

/// Everything the radio needs before advertising data can be set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconConfig {
    pub address: BleAddress,
    pub min_interval_ms: u16,
    pub max_interval_ms: u16,
    pub channel_map: ChannelMap,
    pub power_level: PowerLevel,
    pub address_type: AddressType,
}

// ----------------------------------------------------------------------------
// Radio Port Trait
// ----------------------------------------------------------------------------

/// Low-level advertising engine supplied by the host.
///
/// The engine is exclusive: only one broadcast session may hold it started.
/// Configuration changes only take effect after a fresh `start`.
#[async_trait::async_trait]
pub trait RadioAdvertiser: Send {
    /// Stop any active advertisement. Safe to call when already stopped.
    async fn stop(&mut self);

    async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError>;

    /// Set the raw advertising data (at most 31 bytes)
    async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError>;

    async fn start(&mut self) -> Result<(), RadioError>;

    fn is_advertising(&self) -> bool;
}

#[async_trait::async_trait]
impl<T: RadioAdvertiser + ?Sized> RadioAdvertiser for Box<T> {
    async fn stop(&mut self) {
        (**self).stop().await
    }

    async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError> {
        (**self).set_config(config).await
    }

    async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError> {
        (**self).set_data(data).await
    }

    async fn start(&mut self) -> Result<(), RadioError> {
        (**self).start().await
    }

    fn is_advertising(&self) -> bool {
        (**self).is_advertising()
    }
}

// ----------------------------------------------------------------------------
// Transmission Attempt
// ----------------------------------------------------------------------------

/// One complete transmission: stop, configure, set data, start.
///
/// The first failing step short-circuits the rest.
pub async fn transmit<A>(radio: &mut A, config: &BeaconConfig, data: &[u8]) -> Result<(), RadioError>
where
    A: RadioAdvertiser + ?Sized,
{
    radio.stop().await;
    radio.set_config(config).await?;

    if data.len() > MAX_LEGACY_ADV_DATA_LEN {
        return Err(RadioError::data(format!(
            "advertising data is {} bytes (max: {})",
            data.len(),
            MAX_LEGACY_ADV_DATA_LEN
        )));
    }
    radio.set_data(data).await?;
    radio.start().await?;

    debug!("Beacon started at {}", config.address);
    Ok(())
}

// ----------------------------------------------------------------------------
// Mock Radio
// ----------------------------------------------------------------------------

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockRadio, RadioCall};

#[cfg(any(test, feature = "testing"))]
mod mock {
    use std::collections::VecDeque;

    use super::*;

    /// A port call recorded by [`MockRadio`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RadioCall {
        Stop,
        SetConfig(BeaconConfig),
        SetData(Vec<u8>),
        Start,
    }

    /// In-memory radio that records calls and fails on demand
    #[derive(Debug, Default)]
    pub struct MockRadio {
        calls: Vec<RadioCall>,
        advertising: bool,
        config_failures: VecDeque<bool>,
        data_failures: VecDeque<bool>,
        start_failures: VecDeque<bool>,
        fail_all_starts: bool,
    }

    impl MockRadio {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the outcome of upcoming `set_config` calls (`true` = fail)
        pub fn script_config(&mut self, outcomes: impl IntoIterator<Item = bool>) {
            self.config_failures.extend(outcomes);
        }

        pub fn script_data(&mut self, outcomes: impl IntoIterator<Item = bool>) {
            self.data_failures.extend(outcomes);
        }

        pub fn script_start(&mut self, outcomes: impl IntoIterator<Item = bool>) {
            self.start_failures.extend(outcomes);
        }

        /// Make every `start` fail until cleared
        pub fn fail_all_starts(&mut self, fail: bool) {
            self.fail_all_starts = fail;
        }

        pub fn calls(&self) -> &[RadioCall] {
            &self.calls
        }

        pub fn clear_calls(&mut self) {
            self.calls.clear();
        }

        pub fn configs(&self) -> impl Iterator<Item = &BeaconConfig> {
            self.calls.iter().filter_map(|call| match call {
                RadioCall::SetConfig(config) => Some(config),
                _ => None,
            })
        }

        pub fn data_writes(&self) -> impl Iterator<Item = &[u8]> {
            self.calls.iter().filter_map(|call| match call {
                RadioCall::SetData(data) => Some(data.as_slice()),
                _ => None,
            })
        }

        pub fn start_count(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, RadioCall::Start))
                .count()
        }
    }

    #[async_trait::async_trait]
    impl RadioAdvertiser for MockRadio {
        async fn stop(&mut self) {
            self.calls.push(RadioCall::Stop);
            self.advertising = false;
        }

        async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError> {
            self.calls.push(RadioCall::SetConfig(config.clone()));
            if self.config_failures.pop_front().unwrap_or(false) {
                return Err(RadioError::config("scripted failure"));
            }
            Ok(())
        }

        async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError> {
            self.calls.push(RadioCall::SetData(data.to_vec()));
            if self.data_failures.pop_front().unwrap_or(false) {
                return Err(RadioError::data("scripted failure"));
            }
            Ok(())
        }

        async fn start(&mut self) -> Result<(), RadioError> {
            self.calls.push(RadioCall::Start);
            let scripted = self.start_failures.pop_front().unwrap_or(false);
            if scripted || self.fail_all_starts {
                return Err(RadioError::start("scripted failure"));
            }
            self.advertising = true;
            Ok(())
        }

        fn is_advertising(&self) -> bool {
            self.advertising
        }
    }
}
