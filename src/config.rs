//! Task configuration
//!
//! A [`TaskConfig`] describes how one presentation task's log maps onto event
//! records: which event marks scanner onset, which events to scan for, and
//! which log fields feed each output column. A [`ConfigSet`] holds several
//! task configs keyed by a filename fragment and picks one per input log.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default placeholder written for unresolvable fields
pub const DEFAULT_NULL_OUTPUT: &str = "n/a";

/// Placeholder substituted with the event name inside field templates
pub const EVENT_PLACEHOLDER: &str = "{event}";

/// Configuration for converting one task's logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    /// Event whose `OffsetTime` marks the start of a run
    #[serde(default)]
    pub initial_scanner_event: Option<String>,
    /// Task events to scan for, in output order
    pub events: Vec<String>,
    /// Added to the scanner offset (milliseconds)
    #[serde(default)]
    pub offset_delta: f64,
    /// Emit the response_time column and offset-correct `RTTime`
    #[serde(default, alias = "response_time")]
    pub response_time: bool,
    /// Trial type field template; the column is omitted when unset
    #[serde(default, alias = "trial_type")]
    pub trial_type: Option<String>,
    #[serde(default)]
    pub onset: Option<String>,
    #[serde(default)]
    pub accuracy: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub correct: Option<String>,
    /// Onset of the following event, used only as a duration fallback
    #[serde(default, rename = "next_onset", alias = "nextOnset")]
    pub next_onset: Option<String>,
    /// Frame-scoped field holding the stimulus path
    #[serde(default)]
    pub stimuli: Option<String>,
    #[serde(default = "default_null_output")]
    pub null_output: String,
    /// Raw table values treated as missing
    #[serde(default = "default_csv_null_values")]
    pub csv_null_values: Vec<String>,
    /// Rows discarded before the table header
    #[serde(default, alias = "skip-rows", alias = "skip_rows")]
    pub skip_rows: usize,
    /// First run index used in output names
    #[serde(default, alias = "start_run")]
    pub start_run: usize,
    /// `utf-8` or `utf-16`; a byte-order mark always takes precedence
    #[serde(default)]
    pub encoding: Option<String>,
    /// Table delimiter; defaults to `,` (tab for `.tsv` inputs)
    #[serde(default)]
    pub delimiter: Option<String>,
}

fn default_null_output() -> String {
    DEFAULT_NULL_OUTPUT.to_string()
}

fn default_csv_null_values() -> Vec<String> {
    vec![String::new(), "NULL".to_string()]
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            initial_scanner_event: None,
            events: Vec::new(),
            offset_delta: 0.0,
            response_time: false,
            trial_type: None,
            onset: None,
            accuracy: None,
            response: None,
            correct: None,
            next_onset: None,
            stimuli: None,
            null_output: default_null_output(),
            csv_null_values: default_csv_null_values(),
            skip_rows: 0,
            start_run: 0,
            encoding: None,
            delimiter: None,
        }
    }
}

/// Text encodings accepted for raw logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEncoding {
    Utf8,
    Utf16,
}

impl TaskConfig {
    /// Create a config scanning for the given events with all defaults
    pub fn with_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Parse a single task config from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let config: TaskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.events.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "events must name at least one task event".to_string(),
            ));
        }
        if self.events.iter().any(|e| e.is_empty()) {
            return Err(ConvertError::InvalidConfig(
                "event names must not be empty".to_string(),
            ));
        }
        if matches!(self.initial_scanner_event.as_deref(), Some("")) {
            return Err(ConvertError::InvalidConfig(
                "initialScannerEvent must not be empty".to_string(),
            ));
        }
        if let Some(delimiter) = &self.delimiter {
            if delimiter.len() != 1 {
                return Err(ConvertError::InvalidConfig(format!(
                    "delimiter must be a single byte, got {delimiter:?}"
                )));
            }
        }
        self.log_encoding()?;
        Ok(())
    }

    /// Scanner event name, treating an empty string as unset
    pub fn scanner_event(&self) -> Option<&str> {
        self.initial_scanner_event
            .as_deref()
            .filter(|event| !event.is_empty())
    }

    /// Trial type template; an empty string counts as unset
    pub fn trial_type_field(&self) -> Option<&str> {
        self.trial_type.as_deref().filter(|t| !t.is_empty())
    }

    /// Stimulus field name; an empty string counts as unset
    pub fn stimulus_field(&self) -> Option<&str> {
        self.stimuli.as_deref().filter(|s| !s.is_empty())
    }

    pub fn log_encoding(&self) -> Result<Option<LogEncoding>, ConvertError> {
        match self.encoding.as_deref().map(str::to_ascii_lowercase) {
            None => Ok(None),
            Some(name) => match name.as_str() {
                "utf-8" | "utf8" => Ok(Some(LogEncoding::Utf8)),
                "utf-16" | "utf16" | "utf-16le" => Ok(Some(LogEncoding::Utf16)),
                _ => Err(ConvertError::InvalidConfig(format!(
                    "unsupported encoding {name:?}"
                ))),
            },
        }
    }

    /// Table delimiter as a byte, if configured
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
    }
}

/// A collection of task configs keyed by filename fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSet {
    tasks: BTreeMap<String, TaskConfig>,
    fallback: Option<TaskConfig>,
}

#[derive(Deserialize)]
struct GearFile {
    inputs: GearInputs,
}

#[derive(Deserialize)]
struct GearInputs {
    #[serde(rename = "LogConfig")]
    log_config: GearValue,
}

#[derive(Deserialize)]
struct GearValue {
    value: BTreeMap<String, TaskConfig>,
}

impl ConfigSet {
    /// Build a set from fragment → config pairs
    pub fn new(tasks: BTreeMap<String, TaskConfig>) -> Self {
        Self {
            tasks,
            fallback: None,
        }
    }

    /// A set holding one config that applies to every input
    pub fn single(config: TaskConfig) -> Self {
        Self {
            tasks: BTreeMap::new(),
            fallback: Some(config),
        }
    }

    /// Parse any accepted file shape: a gear manifest (`inputs` key), a
    /// single task config (`events` key), or a fragment → config map
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let shape = value.as_object().map(|object| {
            (object.contains_key("inputs"), object.contains_key("events"))
        });
        Ok(match shape {
            Some((true, _)) => {
                let file: GearFile = serde_json::from_value(value)?;
                Self::new(file.inputs.log_config.value)
            }
            Some((false, true)) => Self::single(serde_json::from_value(value)?),
            _ => Self::new(serde_json::from_value(value)?),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Task configs with their fragments; a single-config set reports `"*"`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskConfig)> {
        self.fallback
            .iter()
            .map(|config| ("*", config))
            .chain(self.tasks.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a config by its exact fragment; a single-config set
    /// answers every fragment
    pub fn get(&self, fragment: &str) -> Option<&TaskConfig> {
        self.fallback.as_ref().or_else(|| self.tasks.get(fragment))
    }

    /// Pick the config whose fragment occurs in `file_name`.
    ///
    /// The longest matching fragment wins; a single-config set matches
    /// everything.
    pub fn select(&self, file_name: &str) -> Result<&TaskConfig, ConvertError> {
        if let Some(config) = &self.fallback {
            return Ok(config);
        }
        self.tasks
            .iter()
            .filter(|(fragment, _)| file_name.contains(fragment.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, config)| config)
            .ok_or_else(|| ConvertError::NoMatchingConfig(file_name.to_string()))
    }
}
