//! Radio advertising backends for the BLE trigger beacon
//!
//! Implements the [`RadioAdvertiser`] port from `trigger-core` for the
//! platforms we can transmit from.
//!
//! ## Platform Support
//!
//! - **Linux** (feature `bluez`): BlueZ via the `bluer` crate. BlueZ manages
//!   the advertising address and channel map itself, so the per-transmission
//!   address is logged but not applied.
//! - **Everywhere else, and `--dry-run`**: [`FallbackAdvertiser`] logs each
//!   advertisement instead of transmitting it.

pub mod ad;
mod advertising;
mod error;

// Public API exports
pub use advertising::{FallbackAdvertiser, PlatformAdvertiser};
#[cfg(all(target_os = "linux", feature = "bluez"))]
pub use advertising::LinuxAdvertiser;
pub use error::AdParseError;

// Re-export the port trait for convenience
pub use trigger_core::RadioAdvertiser;
