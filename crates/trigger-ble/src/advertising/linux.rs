//! Linux BLE advertising implementation using bluer (BlueZ)

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trigger_core::{BeaconConfig, RadioAdvertiser, RadioError};

use crate::ad::service_data_entries;

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

pub struct LinuxAdvertiser {
    adapter_name: Option<String>,
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    advertisement_handle: Option<bluer::adv::AdvertisementHandle>,
    config: Option<BeaconConfig>,
    service_data: BTreeMap<bluer::Uuid, Vec<u8>>,
    address_notice_logged: bool,
}

impl LinuxAdvertiser {
    /// Use the named adapter (e.g. `hci0`), or BlueZ's default when `None`
    pub fn new(adapter_name: Option<String>) -> Self {
        Self {
            adapter_name,
            session: None,
            adapter: None,
            advertisement_handle: None,
            config: None,
            service_data: BTreeMap::new(),
            address_notice_logged: false,
        }
    }

    /// BlueZ picks the advertising address itself and always uses all three
    /// primary channels. Say so once, then keep the per-transmission detail
    /// at debug level.
    fn note_unapplied_settings(&mut self, config: &BeaconConfig) {
        if !self.address_notice_logged {
            warn!(
                "BlueZ chooses the advertising address and channels; requested addresses \
                (e.g. {}) and channel map {:#05b} are not transmitted",
                config.address,
                config.channel_map.bits()
            );
            self.address_notice_logged = true;
        }
        debug!(
            "Requested beacon address {} ({:?}), channel map {:#05b}",
            config.address,
            config.address_type,
            config.channel_map.bits()
        );
    }

    async fn initialize(&mut self) -> Result<&bluer::Adapter, RadioError> {
        if self.session.is_none() {
            let session = bluer::Session::new()
                .await
                .map_err(|e| RadioError::config(format!("BlueZ session: {}", e)))?;

            let adapter = match &self.adapter_name {
                Some(name) => session.adapter(name),
                None => session.default_adapter().await,
            }
            .map_err(|e| RadioError::config(format!("BLE adapter: {}", e)))?;

            // Enable adapter if needed
            if !adapter.is_powered().await.unwrap_or(false) {
                adapter
                    .set_powered(true)
                    .await
                    .map_err(|e| RadioError::config(format!("Failed to power on adapter: {}", e)))?;
            }

            info!("Linux BLE adapter {} initialized for advertising", adapter.name());
            self.session = Some(session);
            self.adapter = Some(adapter);
        }

        self.adapter
            .as_ref()
            .ok_or_else(|| RadioError::config("BLE adapter not available"))
    }
}

#[async_trait]
impl RadioAdvertiser for LinuxAdvertiser {
    async fn stop(&mut self) {
        if let Some(handle) = self.advertisement_handle.take() {
            drop(handle); // Dropping the handle unregisters the advertisement
            debug!("Stopped BLE advertising");
        }
    }

    async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError> {
        self.initialize().await?;
        self.note_unapplied_settings(config);
        self.config = Some(config.clone());
        Ok(())
    }

    async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError> {
        let entries = service_data_entries(data)?;
        if entries.is_empty() {
            warn!("Advertising data carries no service data");
        }
        self.service_data = entries
            .into_iter()
            .map(|entry| (entry.uuid(), entry.data))
            .collect();
        Ok(())
    }

    async fn start(&mut self) -> Result<(), RadioError> {
        let config = self
            .config
            .clone()
            .ok_or_else(|| RadioError::start("beacon has no configuration"))?;
        let service_data = self.service_data.clone();
        let adapter = self.initialize().await?;

        let advertisement = bluer::adv::Advertisement {
            advertisement_type: bluer::adv::Type::Broadcast,
            service_data,
            discoverable: Some(false),
            min_interval: Some(Duration::from_millis(u64::from(config.min_interval_ms))),
            max_interval: Some(Duration::from_millis(u64::from(config.max_interval_ms))),
            tx_power: Some(i16::from(config.power_level.dbm())),
            ..Default::default()
        };

        let handle = adapter
            .advertise(advertisement)
            .await
            .map_err(|e| RadioError::start(format!("Failed to start advertising: {}", e)))?;

        self.advertisement_handle = Some(handle);
        Ok(())
    }

    fn is_advertising(&self) -> bool {
        self.advertisement_handle.is_some()
    }
}
