//! Platform advertiser selection

pub mod fallback;
#[cfg(all(target_os = "linux", feature = "bluez"))]
pub mod linux;

use async_trait::async_trait;
use tracing::info;

use trigger_core::{BeaconConfig, RadioAdvertiser, RadioError};

pub use fallback::FallbackAdvertiser;
#[cfg(all(target_os = "linux", feature = "bluez"))]
pub use linux::LinuxAdvertiser;

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Platform-specific advertiser enum
pub enum PlatformAdvertiser {
    #[cfg(all(target_os = "linux", feature = "bluez"))]
    Linux(LinuxAdvertiser),
    Fallback(FallbackAdvertiser),
}

impl PlatformAdvertiser {
    /// Create the appropriate advertiser for the current platform.
    ///
    /// `dry_run` forces the logging fallback even where hardware is available.
    pub fn new(dry_run: bool, adapter_name: Option<String>) -> Self {
        if dry_run {
            info!("Dry run: advertisements are logged, not transmitted");
            return Self::Fallback(FallbackAdvertiser::new());
        }

        #[cfg(all(target_os = "linux", feature = "bluez"))]
        {
            Self::Linux(LinuxAdvertiser::new(adapter_name))
        }
        #[cfg(not(all(target_os = "linux", feature = "bluez")))]
        {
            let _ = adapter_name;
            tracing::warn!(
                "BLE advertising not supported in this build. Advertisements will only be logged. \
                Build with the `bluez` feature on Linux to transmit."
            );
            Self::Fallback(FallbackAdvertiser::new())
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(_) => "bluez",
            Self::Fallback(_) => "dry-run",
        }
    }
}

impl Default for PlatformAdvertiser {
    fn default() -> Self {
        Self::new(false, None)
    }
}

#[async_trait]
impl RadioAdvertiser for PlatformAdvertiser {
    async fn stop(&mut self) {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(ref mut advertiser) => advertiser.stop().await,
            Self::Fallback(ref mut advertiser) => advertiser.stop().await,
        }
    }

    async fn set_config(&mut self, config: &BeaconConfig) -> Result<(), RadioError> {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(ref mut advertiser) => advertiser.set_config(config).await,
            Self::Fallback(ref mut advertiser) => advertiser.set_config(config).await,
        }
    }

    async fn set_data(&mut self, data: &[u8]) -> Result<(), RadioError> {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(ref mut advertiser) => advertiser.set_data(data).await,
            Self::Fallback(ref mut advertiser) => advertiser.set_data(data).await,
        }
    }

    async fn start(&mut self) -> Result<(), RadioError> {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(ref mut advertiser) => advertiser.start().await,
            Self::Fallback(ref mut advertiser) => advertiser.start().await,
        }
    }

    fn is_advertising(&self) -> bool {
        match self {
            #[cfg(all(target_os = "linux", feature = "bluez"))]
            Self::Linux(ref advertiser) => advertiser.is_advertising(),
            Self::Fallback(ref advertiser) => advertiser.is_advertising(),
        }
    }
}
