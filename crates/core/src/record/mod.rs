//! Structured form of a single logged input occurrence and its row codec.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::{LogFormat, ReplayError, Result};

/// What happened to a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
    /// Keyboard-family label without a matching injection, e.g. `KeyPress`.
    Other(String),
}

/// What happened to a mouse button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseAction {
    Down,
    Up,
    /// Mouse-family label without a button action, e.g. `MouseMove`.
    Other(String),
}

/// Event type decided once when the row is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Key(KeyAction),
    Mouse(MouseAction),
    Unknown(String),
}

impl EventKind {
    /// Classifies the free-form event type column.
    ///
    /// Exact labels win. Otherwise the family is picked by substring, keyboard
    /// before mouse.
    pub fn parse(label: &str) -> Self {
        match label {
            "KeyDown" => Self::Key(KeyAction::Down),
            "KeyUp" => Self::Key(KeyAction::Up),
            "MouseDown" => Self::Mouse(MouseAction::Down),
            "MouseUp" => Self::Mouse(MouseAction::Up),
            other if other.contains("Key") => Self::Key(KeyAction::Other(other.to_string())),
            other if other.contains("Mouse") => {
                Self::Mouse(MouseAction::Other(other.to_string()))
            }
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The text this kind was parsed from.
    pub fn label(&self) -> &str {
        match self {
            Self::Key(KeyAction::Down) => "KeyDown",
            Self::Key(KeyAction::Up) => "KeyUp",
            Self::Mouse(MouseAction::Down) => "MouseDown",
            Self::Mouse(MouseAction::Up) => "MouseUp",
            Self::Key(KeyAction::Other(label))
            | Self::Mouse(MouseAction::Other(label))
            | Self::Unknown(label) => label.as_str(),
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self, Self::Mouse(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// `Left` and `Right` match exactly; any other non-empty text is the
    /// middle button. Empty text means the column was not filled in.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "" => None,
            "Left" => Some(Self::Left),
            "Right" => Some(Self::Right),
            _ => Some(Self::Middle),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Middle => "Middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logged input occurrence.
///
/// Only the fields of the record's family are meaningful: `key_code` and
/// `key_char` for keyboard records, `button`, `x` and `y` for mouse records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-based line in the source log.
    pub line: usize,
    pub kind: EventKind,
    pub timestamp: DateTime<FixedOffset>,
    /// Virtual-key code as written in the log. Converted at dispatch time.
    pub key_code: String,
    /// Human readable key label, diagnostics only.
    pub key_char: String,
    pub button: Option<MouseButton>,
    pub x: i32,
    pub y: i32,
}

impl EventRecord {
    /// Parses one data row.
    ///
    /// Returns `Ok(None)` for rows with too few fields. A bad timestamp or
    /// coordinate is an error. An unvalidated `format` asking for fewer than
    /// [`LogFormat::REQUIRED_FIELDS`] still needs that many.
    pub fn parse_row(line: usize, row: &str, format: &LogFormat) -> Result<Option<Self>> {
        let fields: Vec<&str> = row.split(format.delimiter).collect();
        if fields.len() < format.min_fields.max(LogFormat::REQUIRED_FIELDS) {
            return Ok(None);
        }

        let timestamp = parse_timestamp(fields[1]).map_err(|source| ReplayError::Timestamp {
            line,
            value: fields[1].to_string(),
            source,
        })?;

        Ok(Some(Self {
            line,
            kind: EventKind::parse(fields[0]),
            timestamp,
            key_code: fields[2].to_string(),
            key_char: fields[3].to_string(),
            button: MouseButton::parse(fields[4]),
            x: parse_coordinate(line, fields[5])?,
            y: parse_coordinate(line, fields[6])?,
        }))
    }

    /// Encodes the record back into a data row.
    pub fn to_row(&self, delimiter: char) -> String {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let button = self.button.map(MouseButton::label).unwrap_or_default();
        let x = self.x.to_string();
        let y = self.y.to_string();
        let separator = delimiter.to_string();
        let fields = [
            self.kind.label(),
            timestamp.as_str(),
            self.key_code.as_str(),
            self.key_char.as_str(),
            button,
            x.as_str(),
            y.as_str(),
        ];
        fields.join(separator.as_str())
    }
}

/// Parses a round-trip date-time.
///
/// RFC 3339 text keeps its offset. A local date-time without an offset is
/// taken as UTC.
pub fn parse_timestamp(
    text: &str,
) -> std::result::Result<DateTime<FixedOffset>, chrono::ParseError> {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp);
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))?;
    Ok(naive.and_utc().fixed_offset())
}

fn parse_coordinate(line: usize, text: &str) -> Result<i32> {
    if text.is_empty() {
        return Ok(0);
    }
    text.trim()
        .parse()
        .map_err(|source| ReplayError::Coordinate {
            line,
            value: text.to_string(),
            source,
        })
}
