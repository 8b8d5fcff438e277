//! Advertising data framing
//!
//! The payload travels as a single "Service Data - 16-bit UUID" AD structure:
//!
//! ```text
//! [len = 1 + 2 + N] [0x16] [uuid lo] [uuid hi] [N bytes of service data]
//! ```

use smallvec::SmallVec;

use crate::payload::{ServiceData, SERVICE_DATA_LEN};

// ----------------------------------------------------------------------------
// Protocol Constants
// ----------------------------------------------------------------------------

/// 16-bit service UUID the receivers listen for
pub const SERVICE_UUID_16: u16 = 0xFE6C;

/// AD type: Service Data - 16-bit UUID
pub const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

/// Legacy advertising payload limit
pub const MAX_LEGACY_ADV_DATA_LEN: usize = 31;

/// Length of the framed advertising data for the fixed payload
pub const FRAMED_LEN: usize = 4 + SERVICE_DATA_LEN;

const _: () = assert!(FRAMED_LEN <= MAX_LEGACY_ADV_DATA_LEN);

/// Framed advertising data, sized for a legacy advertisement
pub type AdvertisingData = SmallVec<[u8; MAX_LEGACY_ADV_DATA_LEN]>;

// ----------------------------------------------------------------------------
// Framing
// ----------------------------------------------------------------------------

/// Wrap the service data in its AD structure
pub fn frame_service_data(payload: &ServiceData) -> AdvertisingData {
    let body = payload.as_bytes();
    let mut data = AdvertisingData::new();
    // type + uuid + body
    data.push((1 + 2 + body.len()) as u8);
    data.push(AD_TYPE_SERVICE_DATA_16);
    data.extend_from_slice(&SERVICE_UUID_16.to_le_bytes());
    data.extend_from_slice(body);
    data
}

/// The full 128-bit form of [`SERVICE_UUID_16`] on the Bluetooth base UUID
pub const fn service_uuid_u128() -> u128 {
    0x0000_0000_0000_1000_8000_0080_5F9B_34FB | ((SERVICE_UUID_16 as u128) << 96)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::FuzzValue;

    #[test]
    fn test_frame_layout() {
        let payload = ServiceData::new();
        let framed = frame_service_data(&payload);

        assert_eq!(framed.len(), 28);
        assert_eq!(framed[0], 27);
        assert_eq!(framed[1], 0x16);
        assert_eq!(framed[2], 0x6C);
        assert_eq!(framed[3], 0xFE);
        assert_eq!(&framed[4..], payload.as_bytes());
        assert!(!framed.spilled());
    }

    #[test]
    fn test_frame_carries_fuzzed_bytes_verbatim() {
        let mut payload = ServiceData::new();
        payload.apply_fuzz(FuzzValue::new(0x1234));
        let framed = frame_service_data(&payload);
        assert_eq!(&framed[4..], payload.as_bytes());
    }

    #[test]
    fn test_service_uuid_expansion() {
        assert_eq!(
            service_uuid_u128(),
            0x0000FE6C_0000_1000_8000_00805F9B34FB
        );
    }
}
