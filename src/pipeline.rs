//! Pipeline orchestration
//!
//! This module provides the public API for task-events.
//! It orchestrates the full pipeline from a raw task log to per-run event
//! tables.

use crate::adapters::{decode_log, LogFormat};
use crate::config::TaskConfig;
use crate::encoder::TsvEncoder;
use crate::error::ConvertError;
use crate::naming::output_names;
use crate::segmenter::segment_runs;
use crate::types::{RawFrame, Run};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert decoded log text into runs of event records.
///
/// # Arguments
/// * `content` - Decoded log text
/// * `file_name` - Log file name; `.txt` selects the key/value parser
/// * `config` - Task configuration
///
/// # Returns
/// Runs in log order. A log without valid frames yields no runs.
///
/// # Example
/// ```ignore
/// let config = TaskConfig::from_json(r#"{"events": ["GoImage"]}"#)?;
/// let runs = convert_log(&log_text, "Pokenogo-065-1.txt", &config)?;
/// ```
pub fn convert_log(
    content: &str,
    file_name: &str,
    config: &TaskConfig,
) -> Result<Vec<Run>, ConvertError> {
    // Stage 1: Extract frames
    let frames = extract_frames(content, file_name, config)?;

    if frames.is_empty() {
        tracing::warn!(file_name, "no log frames found, check that a valid log was given");
        return Ok(Vec::new());
    }

    // Stage 2: Segment into runs, normalizing times and resolving fields
    segment_runs(frames, config)
}

/// Parse decoded log text into raw frames with the adapter for its format
pub fn extract_frames(
    content: &str,
    file_name: &str,
    config: &TaskConfig,
) -> Result<Vec<RawFrame>, ConvertError> {
    let adapter = LogFormat::from_file_name(file_name).adapter(config, file_name);
    adapter.extract(content)
}

/// Read and decode a log file
pub fn read_log(path: &Path, config: &TaskConfig) -> Result<String, ConvertError> {
    let bytes = fs::read(path)?;
    decode_log(&bytes, config.log_encoding()?)
}

/// Runs converted from one log, with their output file names
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub runs: Vec<Run>,
    pub file_names: Vec<String>,
}

impl Conversion {
    /// Pairs of (output file name, run)
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Run)> {
        self.file_names
            .iter()
            .map(String::as_str)
            .zip(self.runs.iter())
    }
}

/// Converter bound to one task config.
///
/// Use this when converting several logs of the same task.
#[derive(Debug, Clone)]
pub struct LogConverter {
    config: TaskConfig,
    encoder: TsvEncoder,
    base_name: Option<String>,
}

impl LogConverter {
    /// Create a converter, validating the config first
    pub fn new(config: TaskConfig) -> Result<Self, ConvertError> {
        config.validate()?;
        Ok(Self {
            encoder: TsvEncoder::new(&config),
            config,
            base_name: None,
        })
    }

    /// Name outputs after `base_name` instead of the input file
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn encoder(&self) -> &TsvEncoder {
        &self.encoder
    }

    /// Convert decoded log text
    pub fn convert_str(&self, content: &str, file_name: &str) -> Result<Conversion, ConvertError> {
        let runs = convert_log(content, file_name, &self.config)?;
        let file_names = output_names(
            file_name,
            runs.len(),
            self.config.start_run,
            self.base_name.as_deref(),
        );
        tracing::info!(file_name, runs = runs.len(), "converted log");
        Ok(Conversion { runs, file_names })
    }

    /// Read, decode and convert a log file
    pub fn convert_file(&self, path: &Path) -> Result<Conversion, ConvertError> {
        let content = read_log(path, &self.config)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.convert_str(&content, &file_name)
    }

    /// Write each run of `conversion` into `output_dir`, returning the paths
    pub fn write(&self, conversion: &Conversion, output_dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        fs::create_dir_all(output_dir)?;
        let mut written = Vec::new();
        for (file_name, run) in conversion.outputs() {
            let path = output_dir.join(file_name);
            self.encoder.encode_to_path(&run.records, &path)?;
            tracing::info!(path = %path.display(), records = run.len(), "wrote event table");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_config() -> TaskConfig {
        TaskConfig::from_json(
            r#"{
                "stimuli": "Image",
                "initialScannerEvent": "InitFix",
                "trial_type": "Procedure",
                "offsetDelta": 15,
                "events": ["GoImage", "NogoImage"],
                "response_time": true
            }"#,
        )
        .unwrap()
    }

    fn sample_text_log() -> &'static str {
        "*** Header Start ***
Experiment: Pokenogo_jitter
Subject: 065
*** Header End ***
\tLevel: 3
\t*** LogFrame Start ***
\tProcedure: GoProc
\tImage: pokemon/early.bmp
\tGoImage.OnsetTime: 500
\t*** LogFrame End ***
\tLevel: 3
\t*** LogFrame Start ***
\tProcedure: FixateProc
\tInitFix.OnsetTime: 38345
\tInitFix.OffsetTime: 10
\tInitFix.RT: 0
\t*** LogFrame End ***
\tLevel: 3
\t*** LogFrame Start ***
\tProcedure: GoProc
\tImage: pokemon/charizard.bmp
\tGoImage.OnsetTime: 51358
\tGoImage.OnsetToOnsetTime: 497
\tGoImage.RT: 0
\tGoImage.RESP:
\tGoImage.CRESP: 1
\tGoImage.ACC: 0
\t*** LogFrame End ***
\tLevel: 3
\t*** LogFrame Start ***
\tProcedure: NogoProc
\tImage: pokemon/pokeball.bmp
\tNogoImage.OnsetTime: 52025
\tNogoImage.Duration: 500
\tNogoImage.ACC: 1
\t*** LogFrame End ***
"
    }

    #[test]
    fn test_convert_text_log() {
        let runs = convert_log(sample_text_log(), "Pokenogo-065-1.txt", &sample_config()).unwrap();

        assert_eq!(runs.len(), 1);
        let records = &runs[0].records;
        assert_eq!(records.len(), 3);

        assert_eq!(records[1].onset, "51.333");
        assert_eq!(records[1].duration, "0.497");
        assert_eq!(records[1].response, "");
        assert_eq!(records[1].correct_response, "1");
        assert_eq!(records[2].trial_type.as_deref(), Some("NogoProc"));
        assert_eq!(records[2].duration, "0.5");
        assert_eq!(records[2].response_time.as_deref(), Some("n/a"));
        assert_eq!(records[2].stim_file.as_deref(), Some("pokemon/pokeball.bmp"));
    }

    #[test]
    fn test_convert_table_log() {
        let csv = "Experiment export\n\
                   Procedure,Cue.OnsetTime,Cue.RT,Cue.ACC,Cue.RESP\n\
                   CueProc,1000,350,1,NULL\n\
                   CueProc,3000,,0,2\n";
        let config = TaskConfig {
            skip_rows: 1,
            trial_type: Some("Procedure".to_string()),
            ..TaskConfig::with_events(["Cue"])
        };
        let runs = convert_log(csv, "mid.csv", &config).unwrap();

        assert_eq!(runs.len(), 1);
        let records = &runs[0].records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].onset, "1.0");
        assert_eq!(records[0].response, "n/a");
        assert_eq!(records[1].response, "2");
        assert_eq!(records[1].accuracy, "0");
    }

    #[test]
    fn test_no_frames_yields_no_runs() {
        let runs = convert_log("nothing to see", "broken.txt", &sample_config()).unwrap();
        assert!(runs.is_empty());
    }

    #[test]
    fn test_converter_names_outputs() {
        let converter = LogConverter::new(sample_config()).unwrap();
        let conversion = converter
            .convert_str(sample_text_log(), "Pokenogo-065-1.txt")
            .unwrap();
        assert_eq!(conversion.file_names, vec!["Pokenogo-065-1.tsv".to_string()]);

        let renamed = converter
            .with_base_name("sub-065_task-nogo_events")
            .convert_str(sample_text_log(), "Pokenogo-065-1.txt")
            .unwrap();
        assert_eq!(renamed.file_names, vec!["sub-065_task-nogo_events.tsv".to_string()]);
    }

    #[test]
    fn test_converter_rejects_invalid_config() {
        let result = LogConverter::new(TaskConfig::default());
        assert!(matches!(result, Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn test_convert_and_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Pokenogo-065-1.txt");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in sample_text_log().encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(&input, bytes).unwrap();

        let converter = LogConverter::new(sample_config()).unwrap();
        let conversion = converter.convert_file(&input).unwrap();
        let out_dir = dir.path().join("out");
        let written = converter.write(&conversion, &out_dir).unwrap();

        assert_eq!(written, vec![out_dir.join("Pokenogo-065-1.tsv")]);
        let tsv = fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "onset\tduration\ttrial_type\tresponse_time\tresponse\tcorrect_response\taccuracy\tstim_file"
        );
        assert!(lines[2].starts_with("51.333\t0.497\tGoProc\t0.0\t"));
    }

    #[test]
    fn test_multiple_runs_written_separately() {
        let log = "Level: 1\nInitFix.OffsetTime: 0\nLevel: 1\nGoImage.OnsetTime: 1015\n\
                   Level: 1\nInitFix.OffsetTime: 60000\nLevel: 1\nGoImage.OnsetTime: 61015\n";
        let config = TaskConfig {
            start_run: 1,
            ..sample_config()
        };
        let dir = tempfile::tempdir().unwrap();
        let converter = LogConverter::new(config).unwrap();
        let conversion = converter.convert_str(log, "nogo.txt").unwrap();
        let written = converter.write(&conversion, dir.path()).unwrap();

        assert_eq!(conversion.runs.len(), 2);
        assert_eq!(
            written,
            vec![dir.path().join("nogo_run-1.tsv"), dir.path().join("nogo_run-2.tsv")]
        );
        assert_eq!(conversion.runs[1].records[1].onset, "1.0");
    }
}
