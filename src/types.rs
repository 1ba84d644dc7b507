//! Core types for the task-events pipeline
//!
//! Data flowing through each stage: raw frames extracted from a log, event
//! records built from frames, and runs grouping records by scanner offset.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One flat record of fields captured during a logged trial.
///
/// Keys are frame-scoped (`Subject`) or event-scoped (`GoImage.OnsetTime`).
/// Values stay strings; numeric parsing happens where a value is used.
pub type RawFrame = HashMap<String, String>;

/// Build the event-scoped key `{event}.{property}`
pub fn event_key(event: &str, property: &str) -> String {
    format!("{event}.{property}")
}

/// Whether any key in the frame belongs to `event`
pub fn has_event(frame: &RawFrame, event: &str) -> bool {
    frame.keys().any(|key| {
        key.strip_prefix(event)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// One output row describing a single task event.
///
/// Optional columns are `None` when disabled by configuration; enabled
/// columns always hold a value, possibly the null sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub onset: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    pub response: String,
    pub correct_response: String,
    pub accuracy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stim_file: Option<String>,
}

/// Records sharing one scanner offset, usually one acquisition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Scanner offset (milliseconds) subtracted from this run's timestamps
    pub offset_ms: f64,
    pub records: Vec<EventRecord>,
}

impl Run {
    pub fn new(offset_ms: f64) -> Self {
        Self {
            offset_ms,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Output columns in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Onset,
    Duration,
    TrialType,
    ResponseTime,
    Response,
    CorrectResponse,
    Accuracy,
    StimFile,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Onset => "onset",
            Column::Duration => "duration",
            Column::TrialType => "trial_type",
            Column::ResponseTime => "response_time",
            Column::Response => "response",
            Column::CorrectResponse => "correct_response",
            Column::Accuracy => "accuracy",
            Column::StimFile => "stim_file",
        }
    }

    /// Value of this column in `record`, if the column is populated
    pub fn value<'a>(&self, record: &'a EventRecord) -> Option<&'a str> {
        match self {
            Column::Onset => Some(&record.onset),
            Column::Duration => Some(&record.duration),
            Column::TrialType => record.trial_type.as_deref(),
            Column::ResponseTime => record.response_time.as_deref(),
            Column::Response => Some(&record.response),
            Column::CorrectResponse => Some(&record.correct_response),
            Column::Accuracy => Some(&record.accuracy),
            Column::StimFile => record.stim_file.as_deref(),
        }
    }
}

/// Format a millisecond-derived quantity the way the event tables expect:
/// shortest round-trip representation, always with a fractional part.
pub fn format_number(value: f64) -> String {
    format!("{value:?}")
}
