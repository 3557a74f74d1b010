//! File-backed gravimetric signal provider.
//!
//! Wraps an open [`Table`] into a de-noised physical signal: queries outside
//! the coverage window clamp to the nearest edge sample, successive reads are
//! smoothed with a dead-band (hysteresis) filter, and the raw basis-point
//! value maps onto a fixed lunar tide force range.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::Serialize;

use crate::meta;
use crate::table::Table;
use crate::{Error, Result};

pub const MODE_FILE: &str = "file";

pub const HYSTERESIS_ENV: &str = "HYSTERESIS_BPS";
pub const HYSTERESIS_MAX_BPS: u16 = 10_000;

/// Physical range the basis-point encoding maps onto: 0 bps is the low bound,
/// 10000 bps the high bound.
pub const TIDE_FORCE_MIN: f64 = 80.0;
pub const TIDE_FORCE_MAX: f64 = 130.0;

pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GravimetricData {
    pub lunar_tide_force: f64,
}

/// Contract surface consumed by collaborators (HTTP glue and friends).
pub trait GravimetricProvider {
    fn name(&self) -> &str;
    fn mode(&self) -> &str;
    /// Identifier of the backing dataset; empty when unresolved.
    fn dataset_id(&self) -> &str;
    /// True when `now_ns` falls outside the coverage window. Not an error:
    /// stale fetches are served from the nearest edge sample.
    fn stale(&self, now_ns: i64) -> bool;
    fn fetch(&self, cancel: &CancelToken) -> Result<GravimetricData>;
}

/// Caller-owned cancellation signal checked at entry to `fetch`.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Construction-time provider settings.
///
/// `from_env` preserves the historical `HYSTERESIS_BPS` contract: values
/// outside `[0, 10000]` or unparsable values are ignored and hysteresis stays
/// disabled.
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub dataset_id: Option<String>,
    pub hysteresis_bps: u16,
}

impl ProviderConfig {
    pub fn from_env() -> ProviderConfig {
        let mut config = ProviderConfig::default();
        if let Ok(raw) = std::env::var(HYSTERESIS_ENV) {
            if !raw.is_empty() {
                match raw.parse::<u16>() {
                    Ok(v) if v <= HYSTERESIS_MAX_BPS => config.hysteresis_bps = v,
                    _ => warn!("ignoring invalid {HYSTERESIS_ENV}={raw}"),
                }
            }
        }
        config
    }
}

/// Gravimetric provider backed by a GTAB table.
pub struct FileGravimetric {
    name: String,
    dataset_id: String,
    table: Table,
    start_ns: i64,
    end_ns: i64,
    hysteresis_bps: u16,
    // Last emitted value; None until the first fetch.
    last_bps: Mutex<Option<u16>>,
}

impl FileGravimetric {
    /// Wraps an already-open table. Dataset identity resolution: explicit
    /// non-empty config id, else the sidecar metadata document, else empty.
    pub fn new(table: Table, config: &ProviderConfig) -> FileGravimetric {
        let (start_ns, end_ns) = table.coverage();
        let dataset_id = config
            .dataset_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| meta::dataset_id_for(table.path()))
            .unwrap_or_default();
        let name = table
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        FileGravimetric {
            name,
            dataset_id,
            table,
            start_ns,
            end_ns,
            hysteresis_bps: config.hysteresis_bps,
            last_bps: Mutex::new(None),
        }
    }

    pub fn open(path: impl AsRef<Path>, config: &ProviderConfig) -> Result<FileGravimetric> {
        Ok(FileGravimetric::new(Table::open(path)?, config))
    }

    /// Deterministic fetch at an explicit instant.
    ///
    /// Never fails once constructed: instants outside coverage hold the
    /// nearest edge sample, and a failed read degrades to 0 bps rather than
    /// surfacing an error.
    pub fn fetch_at(&self, at_ns: i64) -> GravimetricData {
        let raw = self.table.lookup_tide_bps(at_ns).unwrap_or_else(|| {
            let edge = if at_ns < self.start_ns {
                self.start_ns
            } else {
                self.end_ns
            };
            self.table.lookup_tide_bps(edge).unwrap_or(0)
        });
        let chosen = self.apply_hysteresis(raw);
        GravimetricData {
            lunar_tide_force: TIDE_FORCE_MIN
                + f64::from(chosen) / 10_000.0 * (TIDE_FORCE_MAX - TIDE_FORCE_MIN),
        }
    }

    // The lock covers only the compare-and-update step, never table reads or
    // the unit conversion. A change below the band sticks to the previous
    // value; a change equal to or beyond it is adopted.
    fn apply_hysteresis(&self, bps: u16) -> u16 {
        let mut last = match self.last_bps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut chosen = bps;
        if self.hysteresis_bps > 0 {
            if let Some(prev) = *last {
                if bps.abs_diff(prev) < self.hysteresis_bps {
                    chosen = prev;
                }
            }
        }
        *last = Some(chosen);
        chosen
    }

    /// Releases the underlying table's file handle.
    pub fn close(&mut self) -> Result<()> {
        self.table.close()
    }
}

impl GravimetricProvider for FileGravimetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> &str {
        MODE_FILE
    }

    fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    fn stale(&self, now_ns: i64) -> bool {
        now_ns < self.start_ns || now_ns > self.end_ns
    }

    fn fetch(&self, cancel: &CancelToken) -> Result<GravimetricData> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self.fetch_at(now_ns()))
    }
}
