//! Scripted key presses and clicks replayed by the headless host.
//!
//! A script is a `;`-separated list of `time@key` or `time@key@x,y` entries.
//! The time is host seconds since launch, the key goes through the hotkey map
//! and the optional point is clicked right before the key is pressed. An empty
//! key (`time@@x,y`) only clicks; `space` spells the pause key.

use std::{error::Error, fmt};

use glam::Vec2;

const ENTRY_DELIMITER: char = ';';
const FIELD_DELIMITER: char = '@';
const SPACE_KEY: &str = "space";

/// Single scripted input.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptEntry {
    /// Host time at which the input fires.
    pub(crate) at: f64,
    /// Key pressed, if any.
    pub(crate) key: Option<char>,
    /// Canvas point clicked before the key press, if any.
    pub(crate) click: Option<Vec2>,
}

/// Time-ordered scripted inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Script {
    entries: Vec<ScriptEntry>,
    cursor: usize,
}

impl Script {
    /// Parses a script. Entries are sorted by time; equal times keep their order.
    pub(crate) fn parse(value: &str) -> Result<Self, ScriptError> {
        let mut entries = value
            .split(ENTRY_DELIMITER)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(|left, right| left.at.total_cmp(&right.at));
        Ok(Self { entries, cursor: 0 })
    }

    /// Removes and returns every entry due at or before `now`.
    pub(crate) fn due(&mut self, now: f64) -> &[ScriptEntry] {
        let start = self.cursor;
        while self
            .entries
            .get(self.cursor)
            .is_some_and(|entry| entry.at <= now)
        {
            self.cursor += 1;
        }
        &self.entries[start..self.cursor]
    }

    /// Number of entries not yet replayed.
    #[must_use]
    pub(crate) fn pending(&self) -> usize {
        self.entries.len() - self.cursor
    }
}

/// Errors that can occur while parsing a script.
#[derive(Debug, PartialEq)]
pub(crate) enum ScriptError {
    /// An entry did not contain the `@` separated time and key.
    MissingKey(String),
    /// The time could not be parsed or was negative.
    InvalidTime(String),
    /// The key field held more than one character.
    InvalidKey(String),
    /// The click point was not two comma separated numbers.
    InvalidPoint(String),
    /// An entry neither pressed a key nor clicked.
    EmptyEntry(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(entry) => write!(f, "script entry '{entry}' is missing a key"),
            Self::InvalidTime(time) => write!(f, "could not parse script time '{time}'"),
            Self::InvalidKey(key) => write!(f, "script key '{key}' is not a single key"),
            Self::InvalidPoint(point) => write!(f, "could not parse click point '{point}'"),
            Self::EmptyEntry(entry) => {
                write!(f, "script entry '{entry}' neither presses a key nor clicks")
            }
        }
    }
}

impl Error for ScriptError {}

fn parse_entry(entry: &str) -> Result<ScriptEntry, ScriptError> {
    let mut fields = entry.split(FIELD_DELIMITER);
    let time = fields.next().unwrap_or_default();
    let key = fields
        .next()
        .ok_or_else(|| ScriptError::MissingKey(entry.to_owned()))?;
    let click = fields.next().map(parse_point).transpose()?;
    if fields.next().is_some() {
        return Err(ScriptError::InvalidPoint(entry.to_owned()));
    }

    let at = time
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|at| at.is_finite() && *at >= 0.0)
        .ok_or_else(|| ScriptError::InvalidTime(time.to_owned()))?;
    let key = parse_key(key)?;
    if key.is_none() && click.is_none() {
        return Err(ScriptError::EmptyEntry(entry.to_owned()));
    }

    Ok(ScriptEntry { at, key, click })
}

fn parse_key(key: &str) -> Result<Option<char>, ScriptError> {
    if key.eq_ignore_ascii_case(SPACE_KEY) {
        return Ok(Some(' '));
    }
    let key = key.trim();
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(single), None) => Ok(Some(single)),
        _ => Err(ScriptError::InvalidKey(key.to_owned())),
    }
}

fn parse_point(point: &str) -> Result<Vec2, ScriptError> {
    let invalid = || ScriptError::InvalidPoint(point.to_owned());
    let (x, y) = point.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok(Vec2::new(x, y))
}
