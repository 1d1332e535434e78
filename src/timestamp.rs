//! Filename-safe timestamps.
//!
//! Backup names are exactly the encoded creation time, so the codec is the
//! only place that knows how a name maps back to a point in time.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::error::FormatError;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampCodec {
    format: String,
}

impl TimestampCodec {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Checks that the format is usable for backup names: valid strftime,
    /// no path separators, and lossless for a second-precision sample.
    pub fn validate(&self) -> Result<(), String> {
        if self.format.trim().is_empty() {
            return Err("dateformat is empty".to_string());
        }
        if self.format.contains('/') {
            return Err(format!("dateformat {:?} must not contain '/'", self.format));
        }
        if StrftimeItems::new(&self.format).any(|item| matches!(item, Item::Error)) {
            return Err(format!("dateformat {:?} is not a valid strftime pattern", self.format));
        }
        let sample = NaiveDate::from_ymd_opt(2001, 2, 3)
            .and_then(|d| d.and_hms_opt(4, 5, 0))
            .ok_or_else(|| "dateformat sample".to_string())?;
        match self.decode(&self.encode(&sample)) {
            Ok(decoded) if decoded == sample => Ok(()),
            _ => Err(format!(
                "dateformat {:?} must encode at least year, month, day, hour and minute",
                self.format
            )),
        }
    }

    pub fn encode(&self, time: &NaiveDateTime) -> String {
        let mut out = String::new();
        // An invalid pattern yields a partial string, which then fails decode.
        let _ = write!(out, "{}", time.format(&self.format));
        out
    }

    /// Decodes a backup name. Names that parse but would not encode back to
    /// the same string (e.g. missing zero padding) are rejected too.
    pub fn decode(&self, name: &str) -> Result<NaiveDateTime, FormatError> {
        let err = || FormatError {
            name: name.to_string(),
            format: self.format.clone(),
        };
        let time = NaiveDateTime::parse_from_str(name, &self.format).map_err(|_| err())?;
        if self.encode(&time) != name {
            return Err(err());
        }
        Ok(time)
    }

    /// Drops the sub-second part when the format cannot carry it, so that
    /// `decode(encode(t)) == t` holds for the returned value.
    pub fn truncate(&self, time: NaiveDateTime) -> NaiveDateTime {
        let encoded = self.encode(&time);
        match self.decode(&encoded) {
            Ok(decoded) => decoded,
            Err(_) => time.with_nanosecond(0).unwrap_or(time),
        }
    }
}

impl Default for TimestampCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}
