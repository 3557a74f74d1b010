//! GTAB gravimetric ephemeris table reader and tide signal provider.
//!
//! A GTAB file is a fixed-interval binary time series: a 47-byte header
//! (magic, version, epoch, sampling interval, record count, optional-field
//! bitmask) followed by fixed-size records. [`Table`] opens and validates a
//! file and answers interpolated tide lookups with O(1) positional reads.
//! [`provider::FileGravimetric`] wraps a table into a de-noised physical
//! signal: edge-clamped queries, a dead-band filter over successive reads,
//! and a fixed affine map from basis points to lunar tide force.

pub mod error;
pub mod fields;
pub mod header;
pub mod meta;
pub mod provider;
pub mod table;
pub mod writer;

pub use error::{Error, Result};
pub use provider::{
    CancelToken, FileGravimetric, GravimetricData, GravimetricProvider, ProviderConfig,
};
pub use table::Table;
pub use writer::{Sample, TableBuilder};
