//! Run segmentation
//!
//! Walks the frame sequence once, splitting it into runs at each scanner
//! sync frame and turning every present event into an [`EventRecord`].
//!
//! With an `initialScannerEvent` configured, a frame holding
//! `{scanner}.OffsetTime` opens a new run and sets its offset; frames before
//! the first sync frame are dropped. Without one, everything lands in a
//! single run with offset 0.

use crate::config::TaskConfig;
use crate::error::ConvertError;
use crate::normalizer::{parse_number, TimeNormalizer};
use crate::resolver::build_record;
use crate::types::{event_key, has_event, RawFrame, Run};

/// Segmentation context for one conversion
pub struct Segmenter<'c> {
    config: &'c TaskConfig,
    normalizer: TimeNormalizer,
    offset_ms: Option<f64>,
    runs: Vec<Run>,
}

impl<'c> Segmenter<'c> {
    pub fn new(config: &'c TaskConfig) -> Self {
        Self {
            config,
            normalizer: TimeNormalizer::from_config(config),
            offset_ms: None,
            runs: Vec::new(),
        }
    }

    /// Consume one frame, appending its records to the open run
    pub fn push(&mut self, mut frame: RawFrame) -> Result<(), ConvertError> {
        let events = match self.boundary_offset(&frame)? {
            Some(offset_ms) => self.open_run(&mut frame, offset_ms)?,
            None => match self.offset_ms {
                Some(offset_ms) => {
                    let events = self.present_events(&frame);
                    for event in &events {
                        self.normalizer.normalize(&mut frame, event, offset_ms)?;
                    }
                    events
                }
                // Before the first scanner sync
                None => return Ok(()),
            },
        };

        let config = self.config;
        if let Some(run) = self.runs.last_mut() {
            run.records
                .extend(events.iter().map(|event| build_record(&frame, event, config)));
        }
        Ok(())
    }

    /// Offset of a new run if `frame` starts one
    fn boundary_offset(&self, frame: &RawFrame) -> Result<Option<f64>, ConvertError> {
        match self.config.scanner_event() {
            Some(scanner) => {
                let key = event_key(scanner, "OffsetTime");
                frame
                    .get(&key)
                    .map(|value| initial_offset(&key, value, self.config))
                    .transpose()
            }
            None if self.runs.is_empty() => Ok(Some(0.0)),
            None => Ok(None),
        }
    }

    fn open_run(&mut self, frame: &mut RawFrame, offset_ms: f64) -> Result<Vec<String>, ConvertError> {
        self.offset_ms = Some(offset_ms);
        self.runs.push(Run::new(offset_ms));
        tracing::debug!(run = self.runs.len(), offset_ms, "opened run");

        let events = match self.config.scanner_event() {
            Some(scanner) => vec![scanner.to_string()],
            None => self.present_events(frame),
        };
        for event in &events {
            self.normalizer.normalize(frame, event, offset_ms)?;
        }
        Ok(events)
    }

    /// Configured events with at least one field in `frame`, in config order
    fn present_events(&self, frame: &RawFrame) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for event in &self.config.events {
            if !events.contains(event) && has_event(frame, event) {
                events.push(event.clone());
            }
        }
        events
    }

    /// Finish segmentation, returning every run opened
    pub fn finish(self) -> Vec<Run> {
        self.runs
    }
}

/// Scanner offset (ms) for a sync frame: the logged offset plus `offsetDelta`
pub fn initial_offset(key: &str, value: &str, config: &TaskConfig) -> Result<f64, ConvertError> {
    Ok(parse_number(key, value)? + config.offset_delta)
}

/// Segment a whole frame sequence into runs
pub fn segment_runs<I>(frames: I, config: &TaskConfig) -> Result<Vec<Run>, ConvertError>
where
    I: IntoIterator<Item = RawFrame>,
{
    let mut segmenter = Segmenter::new(config);
    for frame in frames {
        segmenter.push(frame)?;
    }
    let runs = segmenter.finish();
    tracing::info!(runs = runs.len(), "segmented frames into runs");
    Ok(runs)
}
