//! Fallback advertising implementation for unsupported platforms and dry runs

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trigger_core::{BeaconConfig, RadioAdvertiser, RadioError};

use crate::ad::service_data_entries;

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// Radio that only logs what it would transmit.
///
/// Follows the port's sequencing rules (data needs a config, start needs
/// data) so a dry run exercises the same paths as real hardware.
#[derive(Debug, Default)]
pub struct FallbackAdvertiser {
    config: Option<BeaconConfig>,
    data: Option<Vec<u8>>,
    is_advertising: bool,
    starts: u64,
}

impl FallbackAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful starts so far
    pub fn starts(&self) -> u64 {
        self.starts
    }
}

#[async_trait]
impl RadioAdvertiser for FallbackAdvertiser {
    async fn stop(&mut self) {
        if self.is_advertising {
            debug!("Dry-run beacon stopped");
        }
        self.is_advertising = false;
    }

    async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError> {
        if self.is_advertising {
            return Err(RadioError::config("beacon must be stopped before reconfiguring"));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError> {
        if self.config.is_none() {
            return Err(RadioError::data("beacon has no configuration"));
        }
        // Validate the framing the way a real host stack would
        service_data_entries(data)?;
        self.data = Some(data.to_vec());
        Ok(())
    }

    async fn start(&mut self) -> Result<(), RadioError> {
        let (Some(config), Some(data)) = (&self.config, &self.data) else {
            warn!("Dry-run beacon started without config or data");
            return Err(RadioError::start("beacon has no configuration or data"));
        };

        self.is_advertising = true;
        self.starts += 1;
        info!(
            "[dry-run] advertising as {} every {}-{} ms at {} dBm: {}",
            config.address,
            config.min_interval_ms,
            config.max_interval_ms,
            config.power_level.dbm(),
            hex::encode_upper(data)
        );
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.is_advertising
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trigger_core::radio::transmit;
    use trigger_core::{
        frame_service_data, AddressType, BleAddress, ChannelMap, PowerLevel, ServiceData,
    };

    fn config() -> BeaconConfig {
        BeaconConfig {
            address: BleAddress::new([0xC0, 1, 2, 3, 4, 5]),
            min_interval_ms: 50,
            max_interval_ms: 50,
            channel_map: ChannelMap::ALL,
            power_level: PowerLevel::Plus6dBm,
            address_type: AddressType::Random,
        }
    }

    #[tokio::test]
    async fn test_transmit_sequence_succeeds() {
        let mut radio = FallbackAdvertiser::new();
        let data = frame_service_data(&ServiceData::new());

        transmit(&mut radio, &config(), &data).await.unwrap();
        transmit(&mut radio, &config(), &data).await.unwrap();
        assert!(radio.is_advertising());
        assert_eq!(radio.starts(), 2);

        radio.stop().await;
        radio.stop().await;
        assert!(!radio.is_advertising());
    }

    #[tokio::test]
    async fn test_reconfigure_while_advertising_fails() {
        let mut radio = FallbackAdvertiser::new();
        let data = frame_service_data(&ServiceData::new());
        transmit(&mut radio, &config(), &data).await.unwrap();

        let err = radio.set_config(&config()).await.unwrap_err();
        assert!(matches!(err, RadioError::ConfigFailed { .. }));
    }

    #[tokio::test]
    async fn test_start_without_data_fails() {
        let mut radio = FallbackAdvertiser::new();
        assert!(radio.start().await.is_err());
        assert!(!radio.is_advertising());
    }
}
