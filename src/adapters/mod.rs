//! Raw log adapters
//!
//! This module provides adapters that parse raw presentation-tool logs and
//! map them to an ordered sequence of flat [`RawFrame`]s.

mod decode;
mod table;
mod text;

pub use decode::decode_log;
pub use table::TableLogAdapter;
pub use text::TextLogAdapter;

use crate::config::TaskConfig;
use crate::error::ConvertError;
use crate::types::RawFrame;

/// Trait for raw log adapters.
///
/// An empty result means the log held no valid frames. That is not an error
/// here; the caller decides how to report it.
pub trait FrameExtractor {
    /// Parse decoded log text into frames
    fn extract(&self, content: &str) -> Result<Vec<RawFrame>, ConvertError>;
}

/// Layout of a raw log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `key: value` dump with `Level:` frame markers
    Text,
    /// Delimited table with a header row
    Table,
}

impl LogFormat {
    /// `.txt` logs are key/value dumps; everything else is a table
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.to_ascii_lowercase().ends_with(".txt") {
            LogFormat::Text
        } else {
            LogFormat::Table
        }
    }

    /// Build the adapter for this format from a task config
    pub fn adapter(self, config: &TaskConfig, file_name: &str) -> Box<dyn FrameExtractor> {
        match self {
            LogFormat::Text => Box::new(TextLogAdapter),
            LogFormat::Table => {
                let delimiter = config.delimiter_byte().unwrap_or_else(|| {
                    if file_name.to_ascii_lowercase().ends_with(".tsv") {
                        b'\t'
                    } else {
                        b','
                    }
                });
                Box::new(TableLogAdapter::from_config(config).with_delimiter(delimiter))
            }
        }
    }
}
