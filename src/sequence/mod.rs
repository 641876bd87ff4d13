// The data model side of the sequencer: note lengths on the sixteenth grid,
// sparse pitch lanes, the lane generator, and the scheduler that flattens
// lanes into an absolute-time playback plan.

mod generator;
mod note_length;
mod scheduler;
mod tone;

pub use generator::{PITCH_CLASSES, frequency_of, generate_tones};
pub use note_length::NoteLength;
pub use scheduler::{Schedule, ScheduledNote, order_tones};
pub use tone::Tone;
