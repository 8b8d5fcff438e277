//! Service data payload model
//!
//! The payload is a fixed 24-byte template. A fuzzed variant overwrites four
//! bytes (offsets 10, 11, 20 and 21) with a mapping of a 16-bit fuzz value;
//! every other byte always matches the template.

use core::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Length of the service data carried in every advertisement
pub const SERVICE_DATA_LEN: usize = 24;

/// Base service data template, transmitted verbatim as the "original" payload
pub const BASE_SERVICE_DATA: [u8; SERVICE_DATA_LEN] = [
    0x01, 0x58, 0x38, 0x37, 0x30, 0x30, 0x32, 0x46, // 0-7
    0x50, 0x34, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, // 8-15
    0xCE, 0x1B, 0x33, 0x00, 0x00, 0x02, 0x00, 0x00, // 16-23
];

/// Byte offsets rewritten by [`ServiceData::apply_fuzz`]
pub const FUZZ_OFFSETS: [usize; 4] = [10, 11, 20, 21];

// ----------------------------------------------------------------------------
// Fuzz Value
// ----------------------------------------------------------------------------

/// 16-bit value driving the payload mutation. Arithmetic wraps modulo 65536.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FuzzValue(u16);

impl FuzzValue {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// Next value of a monotonic sweep, wrapping 0xFFFF back to 0
    pub const fn wrapping_next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn high_byte(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn low_byte(self) -> u8 {
        self.0 as u8
    }
}

impl From<u16> for FuzzValue {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for FuzzValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Service Data
// ----------------------------------------------------------------------------

/// Working copy of the service data for one broadcast session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceData {
    current: [u8; SERVICE_DATA_LEN],
}

impl ServiceData {
    /// Create a working buffer holding the base template
    pub fn new() -> Self {
        Self {
            current: BASE_SERVICE_DATA,
        }
    }

    /// Copy the base template over the working buffer
    pub fn reset_to_base(&mut self) {
        self.current = BASE_SERVICE_DATA;
    }

    /// Reset to the template, then write the fuzz mapping into the four
    /// fuzz offsets.
    pub fn apply_fuzz(&mut self, fuzz: FuzzValue) {
        self.reset_to_base();

        let value = fuzz.get();
        self.current[10] = fuzz.high_byte();
        self.current[11] = fuzz.low_byte();
        self.current[20] = (value >> 4) as u8;
        // Shift in u16 then truncate: the top nibble of the low byte is lost
        self.current[21] = (value << 4) as u8;
    }

    pub fn as_bytes(&self) -> &[u8; SERVICE_DATA_LEN] {
        &self.current
    }

    /// Whether the buffer currently holds the unmodified template
    pub fn is_base(&self) -> bool {
        self.current == BASE_SERVICE_DATA
    }
}

impl Default for ServiceData {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for ServiceData {
    fn as_ref(&self) -> &[u8] {
        &self.current
    }
}

impl fmt::Display for ServiceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.current))
    }
}
