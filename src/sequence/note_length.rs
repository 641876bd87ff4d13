use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Symbolic note length on the sixteenth-note grid.
///
/// The text codes ("16n", "8n", ...) are what track files store; they match
/// the notation the original editor used. Anything outside this closed set
/// is a hard error, never a silent default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoteLength {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl NoteLength {
    pub const ALL: [NoteLength; 5] = [
        NoteLength::Sixteenth,
        NoteLength::Eighth,
        NoteLength::Quarter,
        NoteLength::Half,
        NoteLength::Whole,
    ];

    /// Number of grid steps this length covers.
    pub fn steps(self) -> u32 {
        match self {
            NoteLength::Sixteenth => 1,
            NoteLength::Eighth => 2,
            NoteLength::Quarter => 4,
            NoteLength::Half => 8,
            NoteLength::Whole => 16,
        }
    }

    /// The persisted text code.
    pub fn code(self) -> &'static str {
        match self {
            NoteLength::Sixteenth => "16n",
            NoteLength::Eighth => "8n",
            NoteLength::Quarter => "4n",
            NoteLength::Half => "2n",
            NoteLength::Whole => "1n",
        }
    }

    pub fn parse(code: &str) -> Result<Self, Error> {
        match code {
            "16n" => Ok(NoteLength::Sixteenth),
            "8n" => Ok(NoteLength::Eighth),
            "4n" => Ok(NoteLength::Quarter),
            "2n" => Ok(NoteLength::Half),
            "1n" => Ok(NoteLength::Whole),
            other => Err(Error::UnknownNoteLength(other.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoteLength::Sixteenth => "sixteenth",
            NoteLength::Eighth => "eighth",
            NoteLength::Quarter => "quarter",
            NoteLength::Half => "half",
            NoteLength::Whole => "whole",
        }
    }
}

impl TryFrom<String> for NoteLength {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        NoteLength::parse(&value)
    }
}

impl From<NoteLength> for String {
    fn from(value: NoteLength) -> Self {
        value.code().to_string()
    }
}
