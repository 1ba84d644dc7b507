//! Time normalization
//!
//! This module rewrites an event's time fields in place so they read as
//! scanner-relative seconds.
//! - Timestamps (`OnsetTime`, `OffsetTime`, optionally `RTTime`) have the run
//!   offset subtracted, then are scaled from ms to seconds
//! - Intervals (`RT`, `Duration`, `OnsetToOnsetTime`) are only scaled

use crate::config::TaskConfig;
use crate::error::ConvertError;
use crate::types::{event_key, format_number, RawFrame};

const MS_PER_SECOND: f64 = 1000.0;

const TIMESTAMP_FIELDS: &[&str] = &["OnsetTime", "OffsetTime"];
const RESPONSE_TIMESTAMP_FIELD: &str = "RTTime";
const INTERVAL_FIELDS: &[&str] = &["RT", "Duration", "OnsetToOnsetTime"];

/// Normalizer holding the time field sets for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeNormalizer {
    timestamp_fields: Vec<&'static str>,
    interval_fields: Vec<&'static str>,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TimeNormalizer {
    /// `RTTime` is offset-corrected only when response times are reported
    pub fn new(response_time: bool) -> Self {
        let mut timestamp_fields = TIMESTAMP_FIELDS.to_vec();
        if response_time {
            timestamp_fields.push(RESPONSE_TIMESTAMP_FIELD);
        }
        Self {
            timestamp_fields,
            interval_fields: INTERVAL_FIELDS.to_vec(),
        }
    }

    pub fn from_config(config: &TaskConfig) -> Self {
        Self::new(config.response_time)
    }

    /// Rewrite `event`'s time fields in `frame` relative to `offset_ms`.
    ///
    /// Absent fields are skipped. A non-numeric value aborts with
    /// [`ConvertError::InvalidNumber`]; fields already rewritten stay
    /// rewritten.
    pub fn normalize(
        &self,
        frame: &mut RawFrame,
        event: &str,
        offset_ms: f64,
    ) -> Result<(), ConvertError> {
        for field in &self.timestamp_fields {
            rewrite(frame, &event_key(event, field), |ms| {
                (ms - offset_ms) / MS_PER_SECOND
            })?;
        }
        for field in &self.interval_fields {
            rewrite(frame, &event_key(event, field), |ms| ms / MS_PER_SECOND)?;
        }
        Ok(())
    }
}

fn rewrite(frame: &mut RawFrame, key: &str, convert: impl Fn(f64) -> f64) -> Result<(), ConvertError> {
    if let Some(value) = frame.get_mut(key) {
        let ms = parse_number(key, value)?;
        *value = format_number(convert(ms));
    }
    Ok(())
}

/// Parse a numeric log field, naming the field on failure
pub fn parse_number(key: &str, value: &str) -> Result<f64, ConvertError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConvertError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}
