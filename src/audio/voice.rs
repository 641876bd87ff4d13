use crate::audio_api::VoiceConfig;
use crate::synth::WaveType;

use super::frame::StereoFrame;

// headroom so a handful of simultaneous lanes doesn't clip
const VOICE_GAIN: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EnvStage {
    Attack,
    Decay,
    Sustain,
    Release,
}

/// One sounding note: an oscillator run through a linear ADSR envelope.
///
/// The gate stays open for the scheduled duration, then the release tail
/// plays out and the voice frees itself.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    wave: WaveType,
    phase: f32,     // 0..1
    phase_inc: f32, // per sample
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
    stage: EnvStage,
    level: f32,
    release_from: f32,
    gate_remaining: f32, // seconds until release
    sample_dt: f32,
    pub alive: bool,
}

impl Voice {
    pub fn silent() -> Self {
        Self {
            wave: WaveType::Sine,
            phase: 0.0,
            phase_inc: 0.0,
            attack: 0.0,
            decay: 0.0,
            sustain: 0.0,
            release: 0.0,
            stage: EnvStage::Release,
            level: 0.0,
            release_from: 0.0,
            gate_remaining: 0.0,
            sample_dt: 0.0,
            alive: false,
        }
    }

    pub fn start(config: &VoiceConfig, frequency: f32, duration: f64, sample_rate: f32) -> Self {
        // detune is in cents, 1200 to the octave
        let detuned = frequency * 2.0_f32.powf(config.detune / 1200.0);
        Self {
            wave: config.wave,
            phase: 0.0,
            phase_inc: detuned / sample_rate,
            attack: config.attack,
            decay: config.decay,
            sustain: config.sustain,
            release: config.release,
            stage: EnvStage::Attack,
            level: 0.0,
            release_from: 0.0,
            gate_remaining: duration as f32,
            sample_dt: 1.0 / sample_rate,
            alive: true,
        }
    }

    /// Close the gate now, letting the release tail play out.
    pub fn release(&mut self) {
        if self.alive && self.stage != EnvStage::Release {
            self.enter_release();
        }
    }

    fn enter_release(&mut self) {
        self.stage = EnvStage::Release;
        self.release_from = self.level;
    }

    fn oscillator_sample(&self) -> f32 {
        match self.wave {
            WaveType::Sine => (std::f32::consts::TAU * self.phase).sin(),
            WaveType::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveType::Sawtooth => 2.0 * self.phase - 1.0,
            WaveType::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
        }
    }

    fn envelope_step(&mut self) {
        let dt = self.sample_dt;
        match self.stage {
            EnvStage::Attack => {
                if self.attack <= 0.0 {
                    self.level = 1.0;
                } else {
                    self.level += dt / self.attack;
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvStage::Decay;
                }
            }
            EnvStage::Decay => {
                if self.decay <= 0.0 {
                    self.level = self.sustain;
                } else {
                    self.level -= dt * (1.0 - self.sustain) / self.decay;
                }
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    self.stage = EnvStage::Sustain;
                }
            }
            EnvStage::Sustain => {}
            EnvStage::Release => {
                if self.release <= 0.0 {
                    self.level = 0.0;
                } else {
                    self.level -= dt * self.release_from.max(1e-6) / self.release;
                }
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.alive = false;
                }
            }
        }

        if self.stage != EnvStage::Release {
            self.gate_remaining -= dt;
            if self.gate_remaining <= 0.0 {
                self.enter_release();
            }
        }
    }

    /// Mixes this voice into the output block.
    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        if !self.alive {
            return;
        }
        for frame in out.iter_mut() {
            if !self.alive {
                break;
            }
            let sample = self.oscillator_sample() * self.level * VOICE_GAIN;
            frame.left += sample;
            frame.right += sample;

            self.phase += self.phase_inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            self.envelope_step();
        }
    }
}
