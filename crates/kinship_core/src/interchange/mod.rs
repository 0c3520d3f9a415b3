//! CSV interchange engine.
//!
//! # Responsibility
//! - Export the full dataset as a single CSV document.
//! - Import third-party interaction logs with tolerant row skipping.
//!
//! # Invariants
//! - Export and import use two distinct schemas; the engine never
//!   re-imports its own export output.
//! - Export timestamps render `%Y-%m-%d %H:%M:%S` local time, with
//!   sub-second precision truncated.
//! - Import timestamps parse `%Y-%m-%dT%H:%M:%S%.3f%:z`; the `Z`
//!   designator is accepted as UTC.

use crate::db::DbError;
use crate::repo::RepoError;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod export;
mod import;

pub use export::{export_csv, export_csv_to_path};
pub use import::{import_csv, import_csv_from_path, ImportSummary};

const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const IMPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const IMPORT_TIMESTAMP_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub type InterchangeResult<T> = Result<T, InterchangeError>;

/// Failure taxonomy for export/import operations.
///
/// Header and I/O failures abort the whole operation; row-level
/// validation failures never surface here, they only skip the row.
#[derive(Debug)]
pub enum InterchangeError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// The import header does not match the required external schema.
    HeaderMismatch(String),
    /// A stored timestamp cannot be represented in the export format.
    TimestampOutOfRange(i64),
    Repo(RepoError),
}

impl Display for InterchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::HeaderMismatch(found) => write!(
                f,
                "import header mismatch: expected `FeatureName,Timestamp,Value,Label,Note`, found `{found}`"
            ),
            Self::TimestampOutOfRange(epoch_ms) => {
                write!(f, "timestamp {epoch_ms} is not representable in export format")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InterchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InterchangeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for InterchangeError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for InterchangeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for InterchangeError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

/// Renders an epoch-milliseconds value in the export format (local
/// time, second precision).
pub fn format_export_timestamp(epoch_ms: i64) -> InterchangeResult<String> {
    match chrono::Local.timestamp_millis_opt(epoch_ms) {
        LocalResult::Single(datetime) => {
            Ok(datetime.format(EXPORT_TIMESTAMP_FORMAT).to_string())
        }
        _ => Err(InterchangeError::TimestampOutOfRange(epoch_ms)),
    }
}

/// Parses an export-format timestamp back to epoch milliseconds.
///
/// The inverse of [`format_export_timestamp`] up to second precision;
/// used by round-trip verification.
pub fn parse_export_timestamp(value: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(value, EXPORT_TIMESTAMP_FORMAT).ok()?;
    naive
        .and_local_timezone(chrono::Local)
        .single()
        .map(|datetime| datetime.timestamp_millis())
}

/// Parses an import-schema timestamp to epoch milliseconds.
///
/// Accepts an explicit numeric offset (`-08:00`) or the `Z` UTC
/// designator. Returns `None` on any deviation from the fixed
/// pattern; the caller skips that row.
pub fn parse_import_timestamp(value: &str) -> Option<i64> {
    if let Ok(datetime) = DateTime::parse_from_str(value, IMPORT_TIMESTAMP_FORMAT) {
        return Some(datetime.timestamp_millis());
    }

    let utc_part = value.strip_suffix('Z')?;
    let naive = NaiveDateTime::parse_from_str(utc_part, IMPORT_TIMESTAMP_UTC_FORMAT).ok()?;
    Some(naive.and_utc().timestamp_millis())
}
