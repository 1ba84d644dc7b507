//! Field resolution
//!
//! Maps a raw frame and one of its events onto the logical output fields.
//! Each templated field is a [`FieldResolver`] pairing the config option
//! that may override it with a built-in default template. A configured
//! value either contains `{event}` (an event-scoped pattern such as
//! `{event}.ACC`) or names one frame-scoped field shared by all events
//! (such as `Procedure`).

use crate::config::{TaskConfig, EVENT_PLACEHOLDER};
use crate::types::{event_key, format_number, EventRecord, RawFrame};

/// Config options that can override a field template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOption {
    Onset,
    Accuracy,
    Response,
    Correct,
    TrialType,
    NextOnset,
}

impl TemplateOption {
    fn configured<'a>(&self, config: &'a TaskConfig) -> Option<&'a str> {
        let value = match self {
            TemplateOption::Onset => config.onset.as_deref(),
            TemplateOption::Accuracy => config.accuracy.as_deref(),
            TemplateOption::Response => config.response.as_deref(),
            TemplateOption::Correct => config.correct.as_deref(),
            TemplateOption::TrialType => config.trial_type.as_deref(),
            TemplateOption::NextOnset => config.next_onset.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Resolves one templated output field
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    option: TemplateOption,
    default_template: Option<&'static str>,
}

pub const ONSET: FieldResolver = FieldResolver::new(TemplateOption::Onset, Some("{event}.OnsetTime"));
pub const ACCURACY: FieldResolver = FieldResolver::new(TemplateOption::Accuracy, Some("{event}.ACC"));
pub const RESPONSE: FieldResolver = FieldResolver::new(TemplateOption::Response, Some("{event}.RESP"));
pub const CORRECT_RESPONSE: FieldResolver =
    FieldResolver::new(TemplateOption::Correct, Some("{event}.CRESP"));
pub const TRIAL_TYPE: FieldResolver = FieldResolver::new(TemplateOption::TrialType, None);
/// Only meaningful when configured; there is no conventional field name
pub const NEXT_ONSET: FieldResolver = FieldResolver::new(TemplateOption::NextOnset, None);

impl FieldResolver {
    pub const fn new(option: TemplateOption, default_template: Option<&'static str>) -> Self {
        Self {
            option,
            default_template,
        }
    }

    /// Frame key this field reads for `event`, if any
    pub fn key(&self, event: &str, config: &TaskConfig) -> Option<String> {
        match self.option.configured(config) {
            Some(template) if template.contains(EVENT_PLACEHOLDER) => {
                Some(template.replace(EVENT_PLACEHOLDER, event))
            }
            Some(literal) => Some(literal.to_string()),
            None => self
                .default_template
                .map(|template| template.replace(EVENT_PLACEHOLDER, event)),
        }
    }

    /// Raw value of this field, `None` when absent
    pub fn lookup<'f>(&self, frame: &'f RawFrame, event: &str, config: &TaskConfig) -> Option<&'f str> {
        self.key(event, config)
            .and_then(|key| frame.get(&key))
            .map(String::as_str)
    }

    /// Value of this field or the null sentinel
    pub fn resolve(&self, frame: &RawFrame, event: &str, config: &TaskConfig) -> String {
        self.lookup(frame, event, config)
            .map(str::to_string)
            .unwrap_or_else(|| config.null_output.clone())
    }
}

/// Duration: explicit `Duration`, then `OnsetToOnsetTime`, then the gap to
/// the configured next onset.
pub fn resolve_duration(frame: &RawFrame, event: &str, config: &TaskConfig) -> String {
    ["Duration", "OnsetToOnsetTime"]
        .iter()
        .find_map(|property| frame.get(&event_key(event, property)))
        .cloned()
        .or_else(|| onset_gap(frame, event, config))
        .unwrap_or_else(|| config.null_output.clone())
}

/// `next_onset - onset`, when both resolve to numbers
fn onset_gap(frame: &RawFrame, event: &str, config: &TaskConfig) -> Option<String> {
    let next = NEXT_ONSET.lookup(frame, event, config)?;
    let onset = ONSET.lookup(frame, event, config)?;
    if next == config.null_output || onset == config.null_output {
        return None;
    }
    let next: f64 = next.trim().parse().ok()?;
    let onset: f64 = onset.trim().parse().ok()?;
    Some(format_number(round_micros(next - onset)))
}

/// Round to microseconds so float noise from subtraction never prints
fn round_micros(seconds: f64) -> f64 {
    (seconds * 1e6).round() / 1e6
}

/// Response time is always read from `{event}.RT`
pub fn resolve_response_time(frame: &RawFrame, event: &str, config: &TaskConfig) -> String {
    frame
        .get(&event_key(event, "RT"))
        .cloned()
        .unwrap_or_else(|| config.null_output.clone())
}

/// Stimulus path from the configured frame-scoped field
pub fn resolve_stimulus(frame: &RawFrame, stimulus_field: &str, config: &TaskConfig) -> String {
    frame
        .get(stimulus_field)
        .cloned()
        .unwrap_or_else(|| config.null_output.clone())
}

/// Build the output record for one event present in `frame`
pub fn build_record(frame: &RawFrame, event: &str, config: &TaskConfig) -> EventRecord {
    EventRecord {
        onset: ONSET.resolve(frame, event, config),
        duration: resolve_duration(frame, event, config),
        trial_type: config
            .trial_type_field()
            .map(|_| TRIAL_TYPE.resolve(frame, event, config)),
        response_time: config
            .response_time
            .then(|| resolve_response_time(frame, event, config)),
        response: RESPONSE.resolve(frame, event, config),
        correct_response: CORRECT_RESPONSE.resolve(frame, event, config),
        accuracy: ACCURACY.resolve(frame, event, config),
        stim_file: config
            .stimulus_field()
            .map(|field| resolve_stimulus(frame, field, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn go_frame() -> RawFrame {
        [
            ("Procedure", "GoProc"),
            ("Image", "pokemon/charizard.bmp"),
            ("GoImage.OnsetTime", "51343"),
            ("GoImage.OnsetToOnsetTime", "497"),
            ("GoImage.RT", "0"),
            ("GoImage.RESP", "1"),
            ("GoImage.CRESP", "1"),
            ("GoImage.ACC", "1"),
            ("GoImage.Duration", "497"),
            ("Fixcross.OnsetTime", "51840"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_default_template() {
        let config = TaskConfig::with_events(["GoImage"]);
        let frame = go_frame();

        assert_eq!(ONSET.resolve(&frame, "GoImage", &config), "51343");
        assert_eq!(ACCURACY.resolve(&frame, "GoImage", &config), "1");
        assert_eq!(ONSET.resolve(&frame, "NogoImage", &config), "n/a");
    }

    #[test]
    fn test_event_template_override() {
        let config = TaskConfig {
            accuracy: Some("{event}.RESP".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };
        assert_eq!(ACCURACY.key("GoImage", &config).as_deref(), Some("GoImage.RESP"));
    }

    #[test]
    fn test_literal_field_override() {
        let config = TaskConfig {
            trial_type: Some("Procedure".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };
        let frame = go_frame();

        assert_eq!(TRIAL_TYPE.resolve(&frame, "GoImage", &config), "GoProc");
        assert_eq!(TRIAL_TYPE.resolve(&frame, "Fixcross", &config), "GoProc");
    }

    #[test]
    fn test_unconfigured_without_default_is_null() {
        let config = TaskConfig {
            null_output: "NA".to_string(),
            ..TaskConfig::with_events(["GoImage"])
        };
        assert_eq!(TRIAL_TYPE.resolve(&go_frame(), "GoImage", &config), "NA");
        assert_eq!(NEXT_ONSET.key("GoImage", &config), None);
    }

    #[test]
    fn test_duration_fallback_order() {
        let mut frame = go_frame();
        let config = TaskConfig {
            next_onset: Some("Fixcross.OnsetTime".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };

        assert_eq!(resolve_duration(&frame, "GoImage", &config), "497");

        frame.insert("GoImage.OnsetToOnsetTime".to_string(), "500".to_string());
        frame.remove("GoImage.Duration");
        assert_eq!(resolve_duration(&frame, "GoImage", &config), "500");

        frame.remove("GoImage.OnsetToOnsetTime");
        assert_eq!(resolve_duration(&frame, "GoImage", &config), "497.0");
    }

    #[test]
    fn test_duration_gap_of_normalized_onsets_is_rounded() {
        let mut frame = go_frame();
        frame.remove("GoImage.Duration");
        frame.remove("GoImage.OnsetToOnsetTime");
        frame.insert("GoImage.OnsetTime".to_string(), "51.333".to_string());
        frame.insert("Fixcross.OnsetTime".to_string(), "51.84".to_string());
        let config = TaskConfig {
            next_onset: Some("Fixcross.OnsetTime".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };

        assert_eq!(resolve_duration(&frame, "GoImage", &config), "0.507");
    }

    #[test]
    fn test_duration_gap_needs_numbers() {
        let mut frame = go_frame();
        frame.remove("GoImage.Duration");
        frame.remove("GoImage.OnsetToOnsetTime");

        let unconfigured = TaskConfig::with_events(["GoImage"]);
        assert_eq!(resolve_duration(&frame, "GoImage", &unconfigured), "n/a");

        let config = TaskConfig {
            next_onset: Some("Fixcross.OnsetTime".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };
        frame.insert("Fixcross.OnsetTime".to_string(), "soon".to_string());
        assert_eq!(resolve_duration(&frame, "GoImage", &config), "n/a");

        frame.insert("Fixcross.OnsetTime".to_string(), "n/a".to_string());
        assert_eq!(resolve_duration(&frame, "GoImage", &config), "n/a");
    }

    #[test]
    fn test_build_record_columns_follow_config() {
        let frame = go_frame();

        let minimal = build_record(&frame, "GoImage", &TaskConfig::with_events(["GoImage"]));
        assert_eq!(minimal.trial_type, None);
        assert_eq!(minimal.response_time, None);
        assert_eq!(minimal.stim_file, None);

        let config = TaskConfig {
            trial_type: Some("Procedure".to_string()),
            response_time: true,
            stimuli: Some("Image".to_string()),
            ..TaskConfig::with_events(["GoImage"])
        };
        let record = build_record(&frame, "GoImage", &config);
        assert_eq!(
            record,
            EventRecord {
                onset: "51343".to_string(),
                duration: "497".to_string(),
                trial_type: Some("GoProc".to_string()),
                response_time: Some("0".to_string()),
                response: "1".to_string(),
                correct_response: "1".to_string(),
                accuracy: "1".to_string(),
                stim_file: Some("pokemon/charizard.bmp".to_string()),
            }
        );
    }
}
