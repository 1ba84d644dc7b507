//! Raw log decoding
//!
//! Presentation tools commonly write text logs as UTF-16 with a byte-order
//! mark. A BOM always wins; without one the configured encoding applies and
//! UTF-8 is assumed otherwise.

use crate::config::LogEncoding;
use crate::error::ConvertError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode raw log bytes into text
pub fn decode_log(bytes: &[u8], encoding: Option<LogEncoding>) -> Result<String, ConvertError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    match encoding {
        Some(LogEncoding::Utf16) => decode_utf16(bytes, u16::from_le_bytes),
        Some(LogEncoding::Utf8) | None => decode_utf8(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ConvertError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ConvertError::Decode(e.to_string()))
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, ConvertError> {
    if bytes.len() % 2 != 0 {
        return Err(ConvertError::Decode(format!(
            "UTF-16 input has odd length {}",
            bytes.len()
        )));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| ConvertError::Decode(e.to_string()))
}
