//! Event table encoding
//!
//! This module writes runs as tab-separated event tables. The column set is
//! fixed by the task config: onset, duration, trial_type, response_time,
//! response, correct_response, accuracy, stim_file, with disabled columns
//! left out entirely.

use crate::config::TaskConfig;
use crate::error::ConvertError;
use crate::types::{Column, EventRecord};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// TSV encoder for event records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvEncoder {
    columns: Vec<Column>,
    null_output: String,
}

impl TsvEncoder {
    pub fn new(config: &TaskConfig) -> Self {
        let mut columns = vec![Column::Onset, Column::Duration];
        if config.trial_type_field().is_some() {
            columns.push(Column::TrialType);
        }
        if config.response_time {
            columns.push(Column::ResponseTime);
        }
        columns.extend([Column::Response, Column::CorrectResponse, Column::Accuracy]);
        if config.stimulus_field().is_some() {
            columns.push(Column::StimFile);
        }

        Self {
            columns,
            null_output: config.null_output.clone(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Header names in column order
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::as_str).collect()
    }

    /// Write a header row and one row per record
    pub fn encode<W: Write>(&self, records: &[EventRecord], writer: W) -> Result<(), ConvertError> {
        let mut tsv = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        tsv.write_record(self.header())?;
        for record in records {
            // A record built for another config may lack a column
            tsv.write_record(
                self.columns
                    .iter()
                    .map(|column| column.value(record).unwrap_or(self.null_output.as_str())),
            )?;
        }
        tsv.flush()?;
        Ok(())
    }

    pub fn encode_to_string(&self, records: &[EventRecord]) -> Result<String, ConvertError> {
        let mut buffer = Vec::new();
        self.encode(records, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ConvertError::Decode(e.to_string()))
    }

    pub fn encode_to_path(&self, records: &[EventRecord], path: &Path) -> Result<(), ConvertError> {
        let file = File::create(path)?;
        self.encode(records, file)
    }
}
