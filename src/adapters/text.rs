//! Key/value text log adapter
//!
//! Parses line-oriented `key: value` dumps. A line containing `Level: `
//! opens a new frame; fields logged before the first frame are session
//! defaults copied into every frame.

use crate::error::ConvertError;
use crate::types::RawFrame;

use super::FrameExtractor;

/// Marker that opens a new frame
const LEVEL_MARKER: &str = "Level: ";

const LEVEL_KEY: &str = "Level";

/// Text log adapter
pub struct TextLogAdapter;

impl FrameExtractor for TextLogAdapter {
    fn extract(&self, content: &str) -> Result<Vec<RawFrame>, ConvertError> {
        Ok(extract_frames(content))
    }
}

fn extract_frames(content: &str) -> Vec<RawFrame> {
    let mut defaults = RawFrame::new();
    let mut frames: Vec<RawFrame> = Vec::new();

    for line in content.lines() {
        let field = parse_field(line);

        if line.contains(LEVEL_MARKER) {
            frames.push(defaults.clone());
        } else if frames.is_empty() {
            if let Some((key, value)) = field {
                if key != LEVEL_KEY {
                    defaults.insert(key.to_string(), value.to_string());
                }
            }
            continue;
        }

        // Last writer wins within a frame
        if let (Some(frame), Some((key, value))) = (frames.last_mut(), field) {
            frame.insert(key.to_string(), value.to_string());
        }
    }

    tracing::debug!(frames = frames.len(), "extracted text log frames");
    frames
}

/// Split `key: value`; colons inside the value are kept
fn parse_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.trim().split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}
