// gridtone: place notes on a pitch/time grid, hear them through a small
// synth graph. The library is the whole engine; the binary in main.rs is
// just a terminal front end over it.

pub mod audio;
pub mod audio_api;
pub mod error;
pub mod pipeline;
pub mod sequence;
pub mod shared;
pub mod synth;

pub use error::{Error, Result};
pub use pipeline::Track;
pub use shared::PlaybackContext;
