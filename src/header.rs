use std::path::Path;

use crate::{Error, Result};

pub const MAGIC: [u8; 5] = *b"GTAB1";
pub const FORMAT_VERSION: u16 = 1;

/// magic[5] + version u16 + epoch i64 + dt_ns i64 + n u32 + fields_mask u32
/// + reserved[16], little-endian throughout.
pub const HEADER_SIZE: usize = 47;

pub const VERSION_OFFSET: usize = 5;
pub const EPOCH_OFFSET: usize = 7;
pub const INTERVAL_OFFSET: usize = 15;
pub const COUNT_OFFSET: usize = 23;
pub const FIELDS_MASK_OFFSET: usize = 27;
pub const RESERVED_OFFSET: usize = 31;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableHeader {
    pub epoch_sec: i64,
    pub interval_ns: i64,
    pub count: u32,
    pub fields_mask: u32,
}

impl TableHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..VERSION_OFFSET].copy_from_slice(&MAGIC);
        buf[VERSION_OFFSET..EPOCH_OFFSET].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf[EPOCH_OFFSET..INTERVAL_OFFSET].copy_from_slice(&self.epoch_sec.to_le_bytes());
        buf[INTERVAL_OFFSET..COUNT_OFFSET].copy_from_slice(&self.interval_ns.to_le_bytes());
        buf[COUNT_OFFSET..FIELDS_MASK_OFFSET].copy_from_slice(&self.count.to_le_bytes());
        buf[FIELDS_MASK_OFFSET..RESERVED_OFFSET].copy_from_slice(&self.fields_mask.to_le_bytes());
        // reserved bytes stay zeroed
        buf
    }

    /// Parses and validates a header prefix. `path` is carried into errors
    /// so open failures are diagnosable without inspecting the file.
    pub fn parse(path: &Path, bytes: &[u8; HEADER_SIZE]) -> Result<TableHeader> {
        if bytes[..VERSION_OFFSET] != MAGIC {
            return Err(Error::BadMagic {
                path: path.to_path_buf(),
            });
        }
        let version = u16::from_le_bytes(
            bytes[VERSION_OFFSET..EPOCH_OFFSET]
                .try_into()
                .expect("slice length"),
        );
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                path: path.to_path_buf(),
                version,
            });
        }
        let epoch_sec = i64::from_le_bytes(
            bytes[EPOCH_OFFSET..INTERVAL_OFFSET]
                .try_into()
                .expect("slice length"),
        );
        let interval_ns = i64::from_le_bytes(
            bytes[INTERVAL_OFFSET..COUNT_OFFSET]
                .try_into()
                .expect("slice length"),
        );
        let count = u32::from_le_bytes(
            bytes[COUNT_OFFSET..FIELDS_MASK_OFFSET]
                .try_into()
                .expect("slice length"),
        );
        let fields_mask = u32::from_le_bytes(
            bytes[FIELDS_MASK_OFFSET..RESERVED_OFFSET]
                .try_into()
                .expect("slice length"),
        );

        if interval_ns <= 0 {
            return Err(Error::InvalidInterval {
                path: path.to_path_buf(),
                interval_ns,
            });
        }
        if count == 0 {
            return Err(Error::EmptyTable {
                path: path.to_path_buf(),
            });
        }
        if fields_mask == 0 {
            return Err(Error::EmptyRecordLayout {
                path: path.to_path_buf(),
                fields_mask,
            });
        }

        Ok(TableHeader {
            epoch_sec,
            interval_ns,
            count,
            fields_mask,
        })
    }
}
