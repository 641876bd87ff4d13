// The playback side of the engine: track settings, the effect slot state
// machine, the transport/backend seams and the synth graph manager.

pub mod settings;
mod slot;
mod transport;

mod manager;

pub use manager::{SCHEDULE_LOOKAHEAD, SynthManager};
pub use settings::{FilterKind, Rolloff, TrackSettings, WaveType};
pub use slot::{EffectSlot, SlotTransition};
pub use transport::{SharedVirtualBackend, SynthBackend, Transport, TransportState, VirtualBackend};
