use std::fs::File;
use std::io::Read;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::fields::{FieldKind, RecordLayout};
use crate::header::{TableHeader, HEADER_SIZE};
use crate::{Error, Result};

pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// An opened, validated GTAB table.
///
/// Read-only after open: every query is a bounds-checked positional read with
/// no shared cursor and no caching, at most two reads per lookup. A `Table`
/// is safe for unsynchronized concurrent use once opened. `close` drops the
/// file handle; later queries report unavailable instead of panicking.
#[derive(Debug)]
pub struct Table {
    file: Option<File>,
    path: PathBuf,
    header: TableHeader,
    layout: RecordLayout,
    tide_offset: Option<u64>,
    epoch_ns: i64,
    end_ns: i64,
}

impl Table {
    /// Opens a GTAB file, reading exactly the header prefix and validating
    /// the full format contract. The file handle is released on any failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let header = TableHeader::parse(path, &buf)?;

        let layout = RecordLayout::from_mask(header.fields_mask);
        if layout.record_size() == 0 {
            // Mask was non-zero but carried only unaccounted bits.
            return Err(Error::EmptyRecordLayout {
                path: path.to_path_buf(),
                fields_mask: header.fields_mask,
            });
        }

        let len = file.metadata()?.len();
        let expected = HEADER_SIZE as u64 + u64::from(header.count) * layout.record_size();
        if len < expected {
            return Err(Error::Truncated {
                path: path.to_path_buf(),
                have: len,
                expected,
            });
        }

        let overflow = || Error::CoverageOverflow {
            path: path.to_path_buf(),
            epoch_sec: header.epoch_sec,
        };
        let epoch_ns = header
            .epoch_sec
            .checked_mul(NANOS_PER_SEC)
            .ok_or_else(overflow)?;
        let span_ns = i64::from(header.count - 1)
            .checked_mul(header.interval_ns)
            .ok_or_else(overflow)?;
        let end_ns = epoch_ns.checked_add(span_ns).ok_or_else(overflow)?;

        let tide_offset = layout.offset_of(FieldKind::TideBps);
        Ok(Table {
            file: Some(file),
            path: path.to_path_buf(),
            header,
            layout,
            tide_offset,
            epoch_ns,
            end_ns,
        })
    }

    /// Releases the file handle. Subsequent lookups return `None`.
    pub fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Inclusive time window `[epoch, epoch + (n-1)*dt]` in unix nanoseconds.
    pub fn coverage(&self) -> (i64, i64) {
        (self.epoch_ns, self.end_ns)
    }

    /// Maps an instant to `(index, frac)` where `frac == 0` means the instant
    /// lands exactly on a sample. `None` when outside the coverage window.
    pub fn index_for(&self, at_ns: i64) -> Option<(u32, f64)> {
        let pos = (i128::from(at_ns) - i128::from(self.epoch_ns)) as f64
            / self.header.interval_ns as f64;
        if pos < 0.0 || pos > f64::from(self.header.count - 1) {
            return None;
        }
        let i = pos as u32;
        Some((i, pos - f64::from(i)))
    }

    /// Reads tide_bps at record `i`. `None` when the field is absent, the
    /// handle is closed, or the positional read fails.
    fn read_tide_bps(&self, i: u32) -> Option<u16> {
        let off = self.tide_offset?;
        let file = self.file.as_ref()?;
        let pos = HEADER_SIZE as u64 + u64::from(i) * self.layout.record_size() + off;
        let mut buf = [0u8; 2];
        file.read_exact_at(&mut buf, pos).ok()?;
        Some(u16::from_le_bytes(buf))
    }

    /// Linearly interpolated tide_bps at `at_ns`, rounded half-up and clamped
    /// to `[0, 65535]`. `None` folds together out-of-range instants, an
    /// absent tide field, and failed reads.
    pub fn lookup_tide_bps(&self, at_ns: i64) -> Option<u16> {
        let (i, frac) = self.index_for(at_ns)?;
        if frac == 0.0 {
            return self.read_tide_bps(i);
        }
        let v0 = f64::from(self.read_tide_bps(i)?);
        let v1 = f64::from(self.read_tide_bps(i + 1)?);
        let vf = (v0 + (v1 - v0) * frac).clamp(0.0, 65535.0);
        Some((vf + 0.5) as u16)
    }
}
