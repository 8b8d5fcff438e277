//! Link-layer address generation
//!
//! A fresh address is drawn for every transmission. Addresses are never
//! stored or compared against earlier ones; independent sampling is what
//! keeps consecutive transmissions apart.

use core::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Vendor prefix (OUI) used by the vendor-prefixed address mode
pub const VENDOR_PREFIX: [u8; 3] = [0x00, 0x25, 0xDF];

/// Two most-significant bits of byte 0 marking a static random address
pub const STATIC_RANDOM_MASK: u8 = 0xC0;

// ----------------------------------------------------------------------------
// Address Type
// ----------------------------------------------------------------------------

/// A 6-byte BLE device address, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BleAddress([u8; 6]);

impl BleAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn has_prefix(&self, prefix: &[u8; 3]) -> bool {
        self.0[..3] == prefix[..]
    }

    pub fn is_static_random(&self) -> bool {
        self.0[0] & STATIC_RANDOM_MASK == STATIC_RANDOM_MASK
    }
}

impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

// ----------------------------------------------------------------------------
// Generation Policy
// ----------------------------------------------------------------------------

/// How the address for a transmission is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AddressMode {
    /// Fixed three-byte prefix followed by three random bytes
    VendorPrefixed { prefix: [u8; 3] },
    /// Six random bytes with the static random type bits forced on
    FullyRandom,
}

impl AddressMode {
    pub const fn vendor() -> Self {
        AddressMode::VendorPrefixed {
            prefix: VENDOR_PREFIX,
        }
    }
}

impl Default for AddressMode {
    fn default() -> Self {
        Self::vendor()
    }
}

/// Draws per-transmission addresses from an injected random source
pub struct AddressGenerator<R> {
    rng: R,
}

impl<R: RngCore> AddressGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_address(&mut self, mode: AddressMode) -> BleAddress {
        let mut bytes = [0u8; 6];
        match mode {
            AddressMode::VendorPrefixed { prefix } => {
                bytes[..3].copy_from_slice(&prefix);
                self.rng.fill_bytes(&mut bytes[3..]);
            }
            AddressMode::FullyRandom => {
                self.rng.fill_bytes(&mut bytes);
                bytes[0] |= STATIC_RANDOM_MASK;
            }
        }
        BleAddress(bytes)
    }

    /// Access the underlying random source (the controller draws fuzz values
    /// from the same stream)
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
