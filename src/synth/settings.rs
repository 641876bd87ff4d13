use serde::{Deserialize, Serialize};

/// Oscillator wave shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveType {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Biquad filter kind. A track with no filter holds `Option::None` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Allpass,
    Peaking,
    Lowshelf,
    Highshelf,
}

/// Filter rolloff slope in dB per octave, persisted as the plain number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rolloff {
    #[default]
    Db12,
    Db24,
    Db48,
    Db96,
}

impl Rolloff {
    /// How many 12 dB/oct biquad stages the slope cascades.
    pub fn stages(self) -> usize {
        match self {
            Rolloff::Db12 => 1,
            Rolloff::Db24 => 2,
            Rolloff::Db48 => 4,
            Rolloff::Db96 => 8,
        }
    }
}

impl TryFrom<i32> for Rolloff {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -12 => Ok(Rolloff::Db12),
            -24 => Ok(Rolloff::Db24),
            -48 => Ok(Rolloff::Db48),
            -96 => Ok(Rolloff::Db96),
            other => Err(format!("invalid rolloff {other}, expected -12/-24/-48/-96")),
        }
    }
}

impl From<Rolloff> for i32 {
    fn from(value: Rolloff) -> Self {
        match value {
            Rolloff::Db12 => -12,
            Rolloff::Db24 => -24,
            Rolloff::Db48 => -48,
            Rolloff::Db96 => -96,
        }
    }
}

pub const MIN_VOLUME_DB: f32 = -32.0;
pub const MAX_VOLUME_DB: f32 = 32.0;
const MAX_DETUNE_CENTS: f32 = 1200.0;
const MAX_CUTOFF_HZ: f32 = 22_000.0;

/// The full parameter set the synth graph is built from.
///
/// All writes clamp to the valid range and return the stored value, so the
/// settings UI can show what actually took. Effects are optional: `None`
/// means the corresponding node does not exist in the graph at all, which
/// is a different thing from a node with amount zero.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSettings {
    // oscillator
    wave: WaveType,
    detune: f32, // cents
    // amplitude
    volume: f32, // dB
    attack: f32, // seconds
    decay: f32,
    sustain: f32, // level 0..1
    release: f32,
    // filter, ignored unless `filter` is Some
    filter: Option<FilterKind>,
    cutoff: f32, // Hz
    q: f32,
    rolloff: Rolloff,
    // effects
    reverb_amount: Option<f32>, // 0..1
    delay_time: Option<f32>,    // seconds 0..1
    // custom
    is_mute: bool,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            wave: WaveType::Sine,
            detune: 0.0,
            volume: 0.0,
            attack: 0.005,
            decay: 0.1,
            sustain: 0.3,
            release: 1.0,
            filter: None,
            cutoff: 1000.0,
            q: 1.0,
            rolloff: Rolloff::Db12,
            reverb_amount: None,
            delay_time: None,
            is_mute: false,
        }
    }
}

impl TrackSettings {
    pub fn wave(&self) -> WaveType {
        self.wave
    }

    pub fn set_wave(&mut self, wave: WaveType) {
        self.wave = wave;
    }

    pub fn detune(&self) -> f32 {
        self.detune
    }

    pub fn set_detune(&mut self, cents: f32) -> f32 {
        self.detune = cents.clamp(-MAX_DETUNE_CENTS, MAX_DETUNE_CENTS);
        self.detune
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, db: f32) -> f32 {
        self.volume = db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
        self.volume
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn set_attack(&mut self, seconds: f32) -> f32 {
        self.attack = seconds.max(0.0);
        self.attack
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn set_decay(&mut self, seconds: f32) -> f32 {
        self.decay = seconds.max(0.0);
        self.decay
    }

    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    pub fn set_sustain(&mut self, level: f32) -> f32 {
        self.sustain = level.clamp(0.0, 1.0);
        self.sustain
    }

    pub fn release(&self) -> f32 {
        self.release
    }

    pub fn set_release(&mut self, seconds: f32) -> f32 {
        self.release = seconds.max(0.0);
        self.release
    }

    pub fn filter(&self) -> Option<FilterKind> {
        self.filter
    }

    pub fn set_filter(&mut self, kind: Option<FilterKind>) {
        self.filter = kind;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn set_cutoff(&mut self, hz: f32) -> f32 {
        self.cutoff = hz.clamp(1.0, MAX_CUTOFF_HZ);
        self.cutoff
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn set_q(&mut self, q: f32) -> f32 {
        self.q = q.max(0.0);
        self.q
    }

    pub fn rolloff(&self) -> Rolloff {
        self.rolloff
    }

    pub fn set_rolloff(&mut self, rolloff: Rolloff) {
        self.rolloff = rolloff;
    }

    pub fn reverb_amount(&self) -> Option<f32> {
        self.reverb_amount
    }

    pub fn set_reverb_amount(&mut self, amount: Option<f32>) -> Option<f32> {
        self.reverb_amount = amount.map(|a| a.clamp(0.0, 1.0));
        self.reverb_amount
    }

    pub fn delay_time(&self) -> Option<f32> {
        self.delay_time
    }

    pub fn set_delay_time(&mut self, seconds: Option<f32>) -> Option<f32> {
        self.delay_time = seconds.map(|s| s.clamp(0.0, 1.0));
        self.delay_time
    }

    pub fn is_mute(&self) -> bool {
        self.is_mute
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.is_mute = mute;
    }
}
