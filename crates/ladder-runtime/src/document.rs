//! Serialized program format.
//!
//! A program is a JSON array of rungs, each rung an array of
//! `{ "type", "tag", "time" }` records:
//!
//! ```json
//! [
//!   [ { "type": "NO", "tag": "START", "time": null },
//!     { "type": "COIL", "tag": "MOTOR", "time": null } ]
//! ]
//! ```
//!
//! `time` is only meaningful for timer kinds and may be a number or a
//! numeric string (seconds).

#![allow(missing_docs)]

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::value::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramDocument {
    pub rungs: Vec<Vec<ElementRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub time: Option<TimeField>,
}

/// Timer preset in seconds, as written by different producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeField {
    Seconds(f64),
    Text(String),
}

impl TimeField {
    #[must_use]
    pub fn to_duration(&self) -> Option<Duration> {
        match self {
            Self::Seconds(secs) => Duration::from_secs_f64(*secs),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Duration::from_secs_f64),
        }
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(secs) => write!(f, "{secs}"),
            Self::Text(text) => write!(f, "'{text}'"),
        }
    }
}

impl ProgramDocument {
    /// Parse the interchange shape. Blank text and `null` are an empty program.
    pub fn from_json(text: &str) -> Result<Self, RuntimeError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let rungs: Option<Vec<Vec<ElementRecord>>> = serde_json::from_str(text)
            .map_err(|err| RuntimeError::malformed(format!("invalid program json: {err}")))?;
        Ok(Self {
            rungs: rungs.unwrap_or_default(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, RuntimeError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| RuntimeError::malformed(format!("failed to encode program: {err}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            RuntimeError::malformed(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RuntimeError> {
        let path = path.as_ref();
        let text = self.to_json_pretty()?;
        std::fs::write(path, text).map_err(|err| {
            RuntimeError::malformed(format!("failed to write {}: {err}", path.display()))
        })
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.rungs.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_browser_export() {
        let text = r#"[
          [
            { "type": "NO", "tag": "start", "time": null },
            { "type": "TON", "tag": "t1", "time": "2.5" },
            { "type": "SR", "tag": "run", "time": null }
          ]
        ]"#;
        let document = ProgramDocument::from_json(text).unwrap();
        assert_eq!(document.rungs.len(), 1);
        assert_eq!(document.element_count(), 3);
        assert_eq!(
            document.rungs[0][1].time.as_ref().and_then(TimeField::to_duration),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn missing_optional_fields() {
        let document = ProgramDocument::from_json(r#"[[{"type":"COIL"}]]"#).unwrap();
        assert_eq!(document.rungs[0][0].tag, None);
        assert_eq!(document.rungs[0][0].time, None);
    }

    #[test]
    fn empty_inputs_are_empty_programs() {
        assert_eq!(ProgramDocument::from_json("").unwrap().rungs.len(), 0);
        assert_eq!(ProgramDocument::from_json("null").unwrap().rungs.len(), 0);
        assert_eq!(ProgramDocument::from_json("[]").unwrap().rungs.len(), 0);
    }

    #[test]
    fn rejects_non_rung_shapes() {
        let err = ProgramDocument::from_json(r#"{"type":"NO"}"#).unwrap_err();
        assert!(matches!(err, RuntimeError::MalformedProgram(_)));
        let err = ProgramDocument::from_json(r#"[[{"tag":"A"}]]"#).unwrap_err();
        assert!(err.to_string().contains("missing field `type`"));
    }

    #[test]
    fn bad_time_text() {
        assert_eq!(TimeField::Text("soon".into()).to_duration(), None);
        assert_eq!(TimeField::Seconds(-2.0).to_duration(), None);
    }
}
