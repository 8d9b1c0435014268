//! Loop document parser.
//!
//! Documents are JSON objects of the form
//!
//! ```json
//! { "loops": [ { "id": 0, "type": "primal", "cross": [1], "pins": 1, "caps": 0 } ] }
//! ```
//!
//! Every structural problem is reported before any module is built.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tqec_pack_core::{Config, Error};
use tqec_pack_layout::{Loop, LoopType};

/// Errors that can occur when reading documents.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::MalformedInput(e.to_string())
    }
}

impl From<Error> for ParseError {
    fn from(e: Error) -> Self {
        match e {
            Error::MalformedInput(msg) => ParseError::MalformedInput(msg),
            other => ParseError::MalformedInput(other.to_string()),
        }
    }
}

/// Parser for loop documents.
#[derive(Debug, Default)]
pub struct DocumentParser;

impl DocumentParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses loops from a JSON file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Loop>, ParseError> {
        let content = fs::read_to_string(path)?;
        self.parse_json(&content)
    }

    /// Parses loops from a JSON string.
    pub fn parse_json(&self, json: &str) -> Result<Vec<Loop>, ParseError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        self.convert_raw_document(raw)
    }

    /// Loads a compaction configuration from a JSON file.
    pub fn parse_config(&self, path: impl AsRef<Path>) -> Result<Config, ParseError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Converts a raw document, checking references between loops.
    fn convert_raw_document(&self, raw: RawDocument) -> Result<Vec<Loop>, ParseError> {
        if raw.loops.is_empty() {
            return Err(ParseError::MalformedInput(
                "document contains no loops".to_string(),
            ));
        }

        let loops = raw
            .loops
            .into_iter()
            .map(|raw_loop| self.convert_raw_loop(raw_loop))
            .collect::<Result<Vec<Loop>, ParseError>>()?;

        let mut ids = HashSet::with_capacity(loops.len());
        for l in &loops {
            if !ids.insert(l.id()) {
                return Err(ParseError::MalformedInput(format!(
                    "duplicate loop id {}",
                    l.id()
                )));
            }
        }

        let by_id: HashMap<i64, &Loop> = loops.iter().map(|l| (l.id(), l)).collect();
        for l in &loops {
            for &c in l.cross() {
                if c == l.id() {
                    return Err(ParseError::MalformedInput(format!(
                        "loop {} crosses itself",
                        l.id()
                    )));
                }
                let Some(other) = by_id.get(&c) else {
                    return Err(ParseError::MalformedInput(format!(
                        "loop {} crosses unknown loop {}",
                        l.id(),
                        c
                    )));
                };
                if !other.cross().contains(&l.id()) {
                    log::warn!("loop {} crosses {} but not the other way round", l.id(), c);
                }
                if other.loop_type() == l.loop_type() {
                    log::warn!(
                        "loops {} and {} cross but are both {}",
                        l.id(),
                        c,
                        l.loop_type()
                    );
                }
            }
        }

        Ok(loops)
    }

    /// Converts a raw loop record.
    fn convert_raw_loop(&self, raw: RawLoop) -> Result<Loop, ParseError> {
        let loop_type: LoopType = raw.loop_type.parse()?;
        let pins = Self::count(raw.id, "pins", raw.pins)?;
        let caps = Self::count(raw.id, "caps", raw.caps)?;

        Ok(Loop::new(raw.id, loop_type)
            .with_cross(raw.cross)
            .with_pins(pins)
            .with_caps(caps))
    }

    fn count(id: i64, field: &str, value: i64) -> Result<u32, ParseError> {
        u32::try_from(value).map_err(|_| {
            ParseError::MalformedInput(format!(
                "loop {}: '{}' must be a non-negative count, got {}",
                id, field, value
            ))
        })
    }
}

/// Raw document as parsed from JSON.
#[derive(Debug, Deserialize)]
struct RawDocument {
    loops: Vec<RawLoop>,
}

/// Raw loop record as parsed from JSON.
#[derive(Debug, Deserialize)]
struct RawLoop {
    id: i64,
    #[serde(rename = "type")]
    loop_type: String,
    cross: Vec<i64>,
    pins: i64,
    caps: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Loop>, ParseError> {
        DocumentParser::new().parse_json(json)
    }

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "loops": [
                { "id": 0, "type": "primal", "cross": [1], "pins": 1, "caps": 0 },
                { "id": 1, "type": "dual", "cross": [0], "pins": 0, "caps": 2 }
            ]
        }"#;

        let loops = parse(json).unwrap();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].loop_type(), LoopType::Primal);
        assert_eq!(loops[0].cross(), &[1]);
        assert_eq!(loops[1].caps(), 2);
    }

    #[test]
    fn test_rejects_structural_errors() {
        let cases = [
            r#"{ "loops": [] }"#,
            r#"{ "loops": [ { "id": 0, "type": "primal", "cross": [], "pins": 0 } ] }"#,
            r#"{ "loops": [ { "id": 0, "type": "primal", "cross": [], "pins": "1", "caps": 0 } ] }"#,
            r#"{ "loops": [ { "id": 0, "type": "mixed", "cross": [], "pins": 0, "caps": 0 } ] }"#,
            r#"{ "loops": [ { "id": 0, "type": "dual", "cross": [], "pins": -1, "caps": 0 } ] }"#,
            r#"{ "loops": [ { "id": 0, "type": "dual", "cross": [0], "pins": 0, "caps": 0 } ] }"#,
            r#"{ "loops": [ { "id": 0, "type": "dual", "cross": [3], "pins": 0, "caps": 0 } ] }"#,
            r#"{ "loops": [
                { "id": 0, "type": "dual", "cross": [], "pins": 0, "caps": 0 },
                { "id": 0, "type": "primal", "cross": [], "pins": 0, "caps": 0 }
            ] }"#,
            r#"not json"#,
        ];

        for json in cases {
            assert!(
                matches!(parse(json), Err(ParseError::MalformedInput(_))),
                "accepted: {}",
                json
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let result = DocumentParser::new().parse_file("/nonexistent/loops.json");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
