// 🔁 Settings Codec - label settings ⇄ portable JSON
//
// Wire shape:
//   {
//     "globalFontSize": 14,
//     "offsets":      { "<clinic>": { "x": 0, "y": -30, "fs": 16 } },
//     "displayNames": { "<clinic>": "Label text" }
//   }
// Decoding fails closed: any malformed piece rejects the whole document.

use crate::labels::{is_valid_font_size, LabelSettings, SettingsPatch, DEFAULT_GLOBAL_FONT_SIZE};
use serde_json::Value;
use thiserror::Error;

/// File name used when settings are downloaded
pub const SETTINGS_FILE_NAME: &str = "va-clinic-label-settings.json";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings must be a JSON object")]
    NotAnObject,

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Pretty-printed JSON, fields in canonical order.
pub fn encode_settings(settings: &LabelSettings) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(settings)?)
}

/// Parse import text into a patch.
pub fn decode_patch(text: &str) -> Result<SettingsPatch, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    patch_from_value(value)
}

/// Validate an already-parsed JSON value as a patch.
pub fn patch_from_value(value: Value) -> Result<SettingsPatch, CodecError> {
    if !value.is_object() {
        return Err(CodecError::NotAnObject);
    }
    let patch: SettingsPatch = serde_json::from_value(value)?;
    validate(&patch)?;
    Ok(patch)
}

/// Decode a complete aggregate. Missing pieces take their empty/default
/// values; seed offsets are not added here.
pub fn decode_settings(text: &str) -> Result<LabelSettings, CodecError> {
    let patch = decode_patch(text)?;
    Ok(LabelSettings {
        global_font_size: patch.global_font_size.unwrap_or(DEFAULT_GLOBAL_FONT_SIZE),
        offsets: patch.offsets.unwrap_or_default(),
        display_names: patch.display_names.unwrap_or_default(),
    })
}

fn validate(patch: &SettingsPatch) -> Result<(), CodecError> {
    if let Some(size) = patch.global_font_size {
        if !is_valid_font_size(size) {
            return Err(CodecError::InvalidField {
                field: "globalFontSize".to_string(),
                reason: format!("{} is not a positive size", size),
            });
        }
    }

    if let Some(offsets) = &patch.offsets {
        for (name, record) in offsets {
            if !record.is_finite() {
                return Err(CodecError::InvalidField {
                    field: format!("offsets[{}]", name),
                    reason: "non-finite value".to_string(),
                });
            }
            if let Some(fs) = record.fs {
                if !is_valid_font_size(fs) {
                    return Err(CodecError::InvalidField {
                        field: format!("offsets[{}].fs", name),
                        reason: format!("{} is not a positive size", fs),
                    });
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
