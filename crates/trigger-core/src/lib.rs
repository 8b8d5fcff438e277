//! Core of the BLE trigger beacon
//!
//! Builds the fixed service-data payload, mutates it, draws a fresh link-layer
//! address for every transmission and sequences the host's advertising engine
//! through three broadcast modes.
//!
//! ## Architecture
//!
//! - [`payload`] - base template and the four-byte fuzz mapping
//! - [`address`] - per-transmission address generation
//! - [`protocol`] - AD structure framing of the payload
//! - [`radio`] - the advertising port the host implements
//! - [`mode`] - mode state machine
//! - [`controller`] - orchestration of ticks, counters and teardown
//! - [`observer`] - events delivered to the presentation layer
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use trigger_core::{BroadcastConfig, BroadcastController, ModeKind, RadioAdvertiser};
//!
//! # async fn example(radio: impl RadioAdvertiser) -> Result<(), Box<dyn std::error::Error>> {
//! let mut controller = BroadcastController::new(
//!     radio,
//!     StdRng::from_entropy(),
//!     (),
//!     BroadcastConfig::default(),
//! )?;
//!
//! controller.enter_mode(ModeKind::Burst).await?;
//! while let Some(period) = controller.timer_period() {
//!     tokio::time::sleep(period).await;
//!     controller.tick().await;
//! #   break;
//! }
//! controller.exit_mode().await;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod config;
pub mod controller;
pub mod error;
pub mod mode;
pub mod observer;
pub mod payload;
pub mod protocol;
pub mod radio;

// Public API exports
pub use address::{AddressGenerator, AddressMode, BleAddress, VENDOR_PREFIX};
pub use config::BroadcastConfig;
pub use controller::{BroadcastController, SessionSnapshot};
pub use error::{RadioError, Result, TriggerError};
pub use mode::{Mode, ModeKind};
pub use observer::{BroadcastEvent, BroadcastObserver, PayloadKind, TickReport};
pub use payload::{FuzzValue, ServiceData, BASE_SERVICE_DATA, SERVICE_DATA_LEN};
pub use protocol::{frame_service_data, AdvertisingData, SERVICE_UUID_16};
pub use radio::{AddressType, BeaconConfig, ChannelMap, PowerLevel, RadioAdvertiser};

#[cfg(any(test, feature = "testing"))]
pub use radio::{MockRadio, RadioCall};
