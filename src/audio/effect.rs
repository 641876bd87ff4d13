use crate::audio_api::{DelayConfig, FilterConfig, ReverbConfig};
use crate::synth::FilterKind;

use super::frame::StereoFrame;

/// In-place block processor, one per effect node in the graph.
pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

// ── Filter ────────────────────────────────────────────────────────

// The settings layer has no filter gain control, matching the original
// editor, so shelf/peaking run at unity.
const FILTER_GAIN_DB: f32 = 0.0;

#[derive(Clone, Copy, Debug, Default)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    x1: [f32; 2],
    x2: [f32; 2],
    y1: [f32; 2],
    y2: [f32; 2],
}

impl BiquadState {
    fn tick(&mut self, coeffs: &BiquadCoeffs, channel: usize, x: f32) -> f32 {
        let y = coeffs.b0 * x + coeffs.b1 * self.x1[channel] + coeffs.b2 * self.x2[channel]
            - coeffs.a1 * self.y1[channel]
            - coeffs.a2 * self.y2[channel];
        self.x2[channel] = self.x1[channel];
        self.x1[channel] = x;
        self.y2[channel] = self.y1[channel];
        self.y1[channel] = y;
        y
    }
}

// Audio EQ Cookbook biquad, normalized by a0.
fn biquad_coeffs(config: &FilterConfig, sample_rate: f32) -> BiquadCoeffs {
    let w0 = std::f32::consts::TAU * (config.cutoff / sample_rate).min(0.499);
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * config.q.max(0.01));
    let a = 10.0_f32.powf(FILTER_GAIN_DB / 40.0);

    let (b0, b1, b2, a0, a1, a2) = match config.kind {
        FilterKind::Lowpass => {
            let c = (1.0 - cos_w0) / 2.0;
            (c, 1.0 - cos_w0, c, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
        }
        FilterKind::Highpass => {
            let c = (1.0 + cos_w0) / 2.0;
            (c, -(1.0 + cos_w0), c, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
        }
        FilterKind::Bandpass => (
            alpha,
            0.0,
            -alpha,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::Notch => (
            1.0,
            -2.0 * cos_w0,
            1.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::Allpass => (
            1.0 - alpha,
            -2.0 * cos_w0,
            1.0 + alpha,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ),
        FilterKind::Peaking => (
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        ),
        FilterKind::Lowshelf => {
            let s = 2.0 * a.sqrt() * alpha;
            (
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + s),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - s),
                (a + 1.0) + (a - 1.0) * cos_w0 + s,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - s,
            )
        }
        FilterKind::Highshelf => {
            let s = 2.0 * a.sqrt() * alpha;
            (
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + s),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - s),
                (a + 1.0) - (a - 1.0) * cos_w0 + s,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - s,
            )
        }
    };

    BiquadCoeffs {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    }
}

/// Biquad filter; the rolloff slope cascades 12 dB/oct stages.
pub struct Filter {
    config: FilterConfig,
    coeffs: BiquadCoeffs,
    stages: Vec<BiquadState>,
    sample_rate: f32,
}

impl Filter {
    pub fn new(config: FilterConfig, sample_rate: f32) -> Self {
        Self {
            config,
            coeffs: biquad_coeffs(&config, sample_rate),
            stages: vec![BiquadState::default(); config.rolloff.stages()],
            sample_rate,
        }
    }

    /// Mutates parameters in place; filter memory survives unless the
    /// cascade length changes.
    pub fn set_config(&mut self, config: FilterConfig) {
        if config == self.config {
            return;
        }
        self.coeffs = biquad_coeffs(&config, self.sample_rate);
        if config.rolloff.stages() != self.stages.len() {
            self.stages = vec![BiquadState::default(); config.rolloff.stages()];
        }
        self.config = config;
    }
}

impl Effect for Filter {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for frame in buf.iter_mut() {
            let mut left = frame.left;
            let mut right = frame.right;
            for stage in &mut self.stages {
                left = stage.tick(&self.coeffs, 0, left);
                right = stage.tick(&self.coeffs, 1, right);
            }
            frame.left = left;
            frame.right = right;
        }
    }
}

// ── Reverb ────────────────────────────────────────────────────────

// classic parallel comb tunings, in seconds
const COMB_DELAYS: [f32; 4] = [0.0297, 0.0371, 0.0411, 0.0437];
const REVERB_WET: f32 = 0.25;

struct Comb {
    buf: Vec<f32>,
    idx: usize,
    feedback: f32,
}

/// Parallel-comb reverb. The settings amount (0..1) maps to a 0-10 second
/// decay tail, the scaling the original editor used.
pub struct Reverb {
    config: ReverbConfig,
    combs: Vec<Comb>,
}

impl Reverb {
    pub fn new(config: ReverbConfig, sample_rate: f32) -> Self {
        let combs = COMB_DELAYS
            .iter()
            .map(|&delay| Comb {
                buf: vec![0.0; ((delay * sample_rate) as usize).max(1)],
                idx: 0,
                feedback: comb_feedback(delay, config.amount),
            })
            .collect();
        Self { config, combs }
    }

    pub fn set_config(&mut self, config: ReverbConfig) {
        if config == self.config {
            return;
        }
        self.config = config;
        for (comb, &delay) in self.combs.iter_mut().zip(COMB_DELAYS.iter()) {
            comb.feedback = comb_feedback(delay, config.amount);
        }
    }
}

// -60 dB after the decay time
fn comb_feedback(delay: f32, amount: f32) -> f32 {
    let decay = amount * 10.0;
    if decay <= 0.0 {
        0.0
    } else {
        10.0_f32.powf(-3.0 * delay / decay)
    }
}

impl Effect for Reverb {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for frame in buf.iter_mut() {
            let input = (frame.left + frame.right) * 0.5;
            let mut wet = 0.0;
            for comb in &mut self.combs {
                let read = comb.buf[comb.idx];
                comb.buf[comb.idx] = input + read * comb.feedback;
                comb.idx = (comb.idx + 1) % comb.buf.len();
                wet += read;
            }
            wet *= REVERB_WET;
            frame.left += wet;
            frame.right += wet;
        }
    }
}

// ── Delay ─────────────────────────────────────────────────────────

const DELAY_FEEDBACK: f32 = 0.5;

/// Feedback delay line. Feedback is fixed at 0.5 like the original's.
pub struct Delay {
    config: DelayConfig,
    buf: Vec<StereoFrame>,
    idx: usize,
}

impl Delay {
    pub fn new(config: DelayConfig, sample_rate: f32) -> Self {
        Self {
            config,
            buf: vec![StereoFrame::zero(); ((config.time * sample_rate) as usize).max(1)],
            idx: 0,
        }
    }

    pub fn set_config(&mut self, config: DelayConfig, sample_rate: f32) {
        if config.time != self.config.time {
            self.buf = vec![StereoFrame::zero(); ((config.time * sample_rate) as usize).max(1)];
            self.idx = 0;
        }
        self.config = config;
    }
}

impl Effect for Delay {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for frame in buf.iter_mut() {
            let read = self.buf[self.idx];
            self.buf[self.idx] = StereoFrame {
                left: frame.left + read.left * DELAY_FEEDBACK,
                right: frame.right + read.right * DELAY_FEEDBACK,
            };
            self.idx = (self.idx + 1) % self.buf.len();
            frame.left += read.left;
            frame.right += read.right;
        }
    }
}
