//! YAML utilities for race configuration documents
//!
//! Configuration files are frequently pasted from spreadsheets and timing
//! software exports, which leaves stray control characters behind. This module
//! cleans the text before it reaches `serde_yaml_ng`, and provides the serde
//! adapter used for durations written as seconds.

use crate::{Result, TimingError};

/// Strip control characters (except `\n`, `\r`, `\t`) from a YAML document.
///
/// Returns a parse error when nothing but whitespace is left.
pub fn preprocess_config_yaml(yaml: &str) -> Result<String> {
    let cleaned: String = yaml
        .chars()
        .filter(|ch| !matches!(ch, '\x00'..='\x08' | '\x0B'..='\x0C' | '\x0E'..='\x1F' | '\x7F'))
        .collect();

    if cleaned.trim().is_empty() {
        return Err(TimingError::Parse {
            context: "YAML preprocessing".to_string(),
            details: "YAML is empty after preprocessing".to_string(),
        });
    }

    Ok(cleaned)
}

/// Serde adapter for `std::time::Duration` written as (fractional) seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
