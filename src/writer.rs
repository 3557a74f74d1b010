//! GTAB v1 file construction, used by the generator CLI and test fixtures.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::fields::{FieldKind, RecordLayout};
use crate::header::{TableHeader, HEADER_SIZE};
use crate::Result;

/// One record's worth of field values. Only the fields present in the
/// builder's mask are written; the rest are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub tide_bps: u16,
    pub tide_raw: f32,
    pub moon_r_km: f32,
    pub sun_r_km: f32,
    pub moon_r_inv3: f32,
    pub sun_r_inv3: f32,
}

impl Sample {
    pub fn bps(tide_bps: u16) -> Sample {
        Sample {
            tide_bps,
            ..Sample::default()
        }
    }
}

/// Accumulates samples and writes a well-formed GTAB v1 file in one shot.
///
/// The write goes through a sibling tmp file and a rename, so a partially
/// written table is never observable under the target path.
pub struct TableBuilder {
    epoch_sec: i64,
    interval_ns: i64,
    fields_mask: u32,
    samples: Vec<Sample>,
}

impl TableBuilder {
    pub fn new(epoch_sec: i64, interval_ns: i64, fields_mask: u32) -> TableBuilder {
        TableBuilder {
            epoch_sec,
            interval_ns,
            fields_mask,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn extend_bps(&mut self, values: &[u16]) {
        for &v in values {
            self.samples.push(Sample::bps(v));
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let header = TableHeader {
            epoch_sec: self.epoch_sec,
            interval_ns: self.interval_ns,
            count: self.samples.len() as u32,
            fields_mask: self.fields_mask,
        };
        let layout = RecordLayout::from_mask(self.fields_mask);
        let mut buf =
            Vec::with_capacity(HEADER_SIZE + self.samples.len() * layout.record_size() as usize);
        buf.extend_from_slice(&header.to_bytes());
        for sample in &self.samples {
            for &(kind, _) in layout.present() {
                match kind {
                    FieldKind::TideBps => buf.extend_from_slice(&sample.tide_bps.to_le_bytes()),
                    FieldKind::TideRawF32 => buf.extend_from_slice(&sample.tide_raw.to_le_bytes()),
                    FieldKind::MoonRkmF32 => buf.extend_from_slice(&sample.moon_r_km.to_le_bytes()),
                    FieldKind::SunRkmF32 => buf.extend_from_slice(&sample.sun_r_km.to_le_bytes()),
                    FieldKind::MoonRinv3F32 => {
                        buf.extend_from_slice(&sample.moon_r_inv3.to_le_bytes())
                    }
                    FieldKind::SunRinv3F32 => {
                        buf.extend_from_slice(&sample.sun_r_inv3.to_le_bytes())
                    }
                }
            }
        }

        let tmp_path = path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        std::fs::rename(tmp_path, path)?;
        Ok(())
    }
}
