use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the sequencing and playback engine.
#[derive(Debug, Error)]
pub enum Error {
    // the generator refuses out-of-range requests outright; the Track
    // setter is the layer that clamps instead
    #[error("octave count must be between 1 and 8, got {0}")]
    InvalidOctaveCount(u32),

    #[error("unknown note length code `{0}`")]
    UnknownNoteLength(String),

    #[error("malformed track file: {0}")]
    MalformedProject(String),

    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),
}
