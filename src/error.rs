use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    BadMagic { path: PathBuf },
    UnsupportedVersion { path: PathBuf, version: u16 },
    InvalidInterval { path: PathBuf, interval_ns: i64 },
    EmptyTable { path: PathBuf },
    EmptyRecordLayout { path: PathBuf, fields_mask: u32 },
    Truncated { path: PathBuf, have: u64, expected: u64 },
    CoverageOverflow { path: PathBuf, epoch_sec: i64 },
    Json(serde_json::Error),
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::BadMagic { path } => write!(f, "{}: invalid GTAB magic", path.display()),
            Error::UnsupportedVersion { path, version } => {
                write!(f, "{}: unsupported GTAB version: {version}", path.display())
            }
            Error::InvalidInterval { path, interval_ns } => {
                write!(f, "{}: invalid dt_ns: {interval_ns}", path.display())
            }
            Error::EmptyTable { path } => write!(f, "{}: empty table (n=0)", path.display()),
            Error::EmptyRecordLayout { path, fields_mask } => {
                write!(
                    f,
                    "{}: empty record layout (fields_mask={fields_mask:#x})",
                    path.display()
                )
            }
            Error::Truncated {
                path,
                have,
                expected,
            } => write!(
                f,
                "{}: truncated GTAB file: have {have} bytes, expected {expected}",
                path.display()
            ),
            Error::CoverageOverflow { path, epoch_sec } => write!(
                f,
                "{}: coverage window out of range (epoch_sec={epoch_sec})",
                path.display()
            ),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Cancelled => write!(f, "fetch cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
