//! Delimited table log adapter
//!
//! Parses CSV-style exports: optional leading junk rows, one header row,
//! then one frame per data row.

use crate::config::TaskConfig;
use crate::error::ConvertError;
use crate::types::RawFrame;
use csv::ReaderBuilder;
use std::collections::HashSet;

use super::FrameExtractor;

/// Table log adapter
#[derive(Debug, Clone)]
pub struct TableLogAdapter {
    skip_rows: usize,
    null_values: HashSet<String>,
    delimiter: u8,
}

impl Default for TableLogAdapter {
    fn default() -> Self {
        Self::from_config(&TaskConfig::default())
    }
}

impl TableLogAdapter {
    pub fn new<I, S>(skip_rows: usize, null_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip_rows,
            null_values: null_values.into_iter().map(Into::into).collect(),
            delimiter: b',',
        }
    }

    pub fn from_config(config: &TaskConfig) -> Self {
        Self::new(config.skip_rows, config.csv_null_values.iter().cloned())
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl FrameExtractor for TableLogAdapter {
    /// Duplicate header names are unsupported: the rightmost column wins.
    fn extract(&self, content: &str) -> Result<Vec<RawFrame>, ConvertError> {
        // Skipped rows are physical lines, blank ones included
        let body = match skip_lines(content, self.skip_rows) {
            Some(body) => body,
            None => return Ok(Vec::new()),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(body.as_bytes());
        let mut rows = reader.records();

        let header = match rows.next().transpose()? {
            Some(header) => header,
            None => return Ok(Vec::new()),
        };

        let mut frames = Vec::new();
        for (index, row) in rows.enumerate() {
            let row = row?;
            // One misaligned row poisons the whole table
            if row.len() > header.len() {
                tracing::warn!(
                    row = index + 1,
                    fields = row.len(),
                    columns = header.len(),
                    "row is longer than header, discarding table"
                );
                return Ok(Vec::new());
            }

            let frame: RawFrame = header
                .iter()
                .zip(row.iter())
                .filter(|(_, value)| !self.null_values.contains(*value))
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            frames.push(frame);
        }

        tracing::debug!(frames = frames.len(), "extracted table log frames");
        Ok(frames)
    }
}

/// Text after the first `count` lines, or `None` if there are fewer
fn skip_lines(content: &str, count: usize) -> Option<&str> {
    if count == 0 {
        return Some(content);
    }
    content
        .match_indices('\n')
        .nth(count - 1)
        .map(|(index, _)| &content[index + 1..])
}
