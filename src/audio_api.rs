// The vocabulary crossing the audio boundary: configs describing the synth
// graph, tasks the transport fires at absolute times, commands into the
// engine and notices back out. Everything here is plain data so the audio
// thread never shares state with the editing side.

use crate::synth::settings::{FilterKind, Rolloff, WaveType};

/// Parameters of the polyphonic voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceConfig {
    pub wave: WaveType,
    pub detune: f32, // cents
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub volume: f32, // dB
    pub mute: bool,
}

// mirrors TrackSettings::default so a fresh engine is playable before the
// first Configure lands
impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wave: WaveType::Sine,
            detune: 0.0,
            attack: 0.005,
            decay: 0.1,
            sustain: 0.3,
            release: 1.0,
            volume: 0.0,
            mute: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterConfig {
    pub kind: FilterKind,
    pub cutoff: f32,
    pub q: f32,
    pub rolloff: Rolloff,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbConfig {
    /// 0..1, scaled to a 0-10 second decay tail.
    pub amount: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DelayConfig {
    /// Delay time in seconds. Feedback is fixed at 0.5.
    pub time: f32,
}

/// The whole graph in one message: voice plus whichever effects exist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphConfig {
    pub voice: VoiceConfig,
    pub filter: Option<FilterConfig>,
    pub reverb: Option<ReverbConfig>,
    pub delay: Option<DelayConfig>,
}

/// Work the transport performs when its clock reaches the scheduled time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransportTask {
    /// Play a note for `duration` seconds.
    Trigger { frequency: f32, duration: f64 },
    /// Emit the end-of-playback notice.
    FinishPlayback,
}

/// Commands sent to the engine; drained at the top of the render callback.
#[derive(Clone, Debug)]
pub enum AudioCommand {
    Configure(GraphConfig),
    Connect,
    Disconnect,
    Schedule { at: f64, task: TransportTask },
    CancelScheduled,
    ReleaseAll,
    Start,
}

/// Notices the engine sends back to the editing side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineNotice {
    PlaybackDone,
}
