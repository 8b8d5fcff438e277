//! Decoding of the raw advertising data handed to a backend
//!
//! Host stacks such as BlueZ take typed fields instead of raw bytes, so
//! backends split the AD structures back out before handing them over.

use uuid::Uuid;

use crate::error::AdParseError;

/// AD type: Service Data - 16-bit UUID
pub const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// One length-prefixed AD structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStructure<'a> {
    pub ad_type: u8,
    pub data: &'a [u8],
}

/// Service data carried under a 16-bit UUID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDataEntry {
    pub uuid16: u16,
    pub data: Vec<u8>,
}

impl ServiceDataEntry {
    /// The 128-bit UUID on the Bluetooth base UUID
    pub fn uuid(&self) -> Uuid {
        uuid_from_u16(self.uuid16)
    }
}

pub fn uuid_from_u16(uuid16: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | (u128::from(uuid16) << 96))
}

/// Split raw advertising data into its AD structures
pub fn parse_structures(raw: &[u8]) -> Result<Vec<AdStructure<'_>>, AdParseError> {
    let mut structures = Vec::new();
    let mut offset = 0;

    while offset < raw.len() {
        let length = raw[offset] as usize;
        if length == 0 {
            // Zero length terminates significant data in a padded buffer
            if raw[offset..].iter().all(|byte| *byte == 0) {
                break;
            }
            return Err(AdParseError::EmptyStructure { offset });
        }

        let available = raw.len() - offset - 1;
        if length > available {
            return Err(AdParseError::Truncated {
                offset,
                length,
                available,
            });
        }

        structures.push(AdStructure {
            ad_type: raw[offset + 1],
            data: &raw[offset + 2..offset + 1 + length],
        });
        offset += 1 + length;
    }

    Ok(structures)
}

/// Extract every 16-bit service data entry from raw advertising data
pub fn service_data_entries(raw: &[u8]) -> Result<Vec<ServiceDataEntry>, AdParseError> {
    let mut entries = Vec::new();
    let mut offset = 0;

    for structure in parse_structures(raw)? {
        if structure.ad_type == AD_TYPE_SERVICE_DATA_16 {
            if structure.data.len() < 2 {
                return Err(AdParseError::MissingUuid { offset });
            }
            entries.push(ServiceDataEntry {
                uuid16: u16::from_le_bytes([structure.data[0], structure.data[1]]),
                data: structure.data[2..].to_vec(),
            });
        }
        offset += 2 + structure.data.len();
    }

    Ok(entries)
}
