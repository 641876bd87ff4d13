use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use crate::audio_api::{AudioCommand, EngineNotice, GraphConfig, TransportTask, VoiceConfig};

use super::effect::{Delay, Effect, Filter, Reverb};
use super::frame::StereoFrame;
use super::voice::Voice;

const MAX_VOICES: usize = 32; // hard cap so we never grow the pool in the callback

fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// The audio-thread half of the transport: a sample clock, the pending
/// task queue and the actual synth graph nodes.
///
/// The clock is published through an atomic so the editing side can read
/// transport time without touching the thread; it only advances while the
/// transport is started, and starting twice is a no-op.
pub struct Engine {
    sample_rate: f32,
    started: bool,
    connected: bool,
    clock_samples: Arc<AtomicU64>,
    pending: Vec<(f64, TransportTask)>,
    voices: [Voice; MAX_VOICES],
    voice_config: VoiceConfig,
    filter: Option<Filter>,
    reverb: Option<Reverb>,
    delay: Option<Delay>,
    notice_tx: Sender<EngineNotice>,
}

impl Engine {
    pub fn new(
        sample_rate: f32,
        clock_samples: Arc<AtomicU64>,
        notice_tx: Sender<EngineNotice>,
    ) -> Self {
        Self {
            sample_rate,
            started: false,
            connected: false,
            clock_samples,
            pending: Vec::with_capacity(1024),
            voices: [Voice::silent(); MAX_VOICES],
            voice_config: VoiceConfig::default(),
            filter: None,
            reverb: None,
            delay: None,
            notice_tx,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Configure(graph) => self.apply_graph(graph),
            AudioCommand::Connect => self.connected = true,
            AudioCommand::Disconnect => self.connected = false,
            AudioCommand::Schedule { at, task } => self.pending.push((at, task)),
            AudioCommand::CancelScheduled => self.pending.clear(),
            AudioCommand::ReleaseAll => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
            AudioCommand::Start => self.started = true,
        }
    }

    // create / mutate / drop each node so it matches the config
    fn apply_graph(&mut self, graph: GraphConfig) {
        self.voice_config = graph.voice;

        match (&mut self.filter, graph.filter) {
            (Some(node), Some(config)) => node.set_config(config),
            (node @ None, Some(config)) => *node = Some(Filter::new(config, self.sample_rate)),
            (node, None) => *node = None,
        }
        match (&mut self.reverb, graph.reverb) {
            (Some(node), Some(config)) => node.set_config(config),
            (node @ None, Some(config)) => *node = Some(Reverb::new(config, self.sample_rate)),
            (node, None) => *node = None,
        }
        match (&mut self.delay, graph.delay) {
            (Some(node), Some(config)) => node.set_config(config, self.sample_rate),
            (node @ None, Some(config)) => *node = Some(Delay::new(config, self.sample_rate)),
            (node, None) => *node = None,
        }
    }

    fn trigger(&mut self, frequency: f32, duration: f64) {
        let slot = self
            .voices
            .iter()
            .position(|v| !v.alive)
            .unwrap_or(0); // steal the first voice when the pool is full
        self.voices[slot] = Voice::start(&self.voice_config, frequency, duration, self.sample_rate);
    }

    /// Renders one output block and advances the transport clock past it.
    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = StereoFrame::zero();
        }
        if !self.started {
            return;
        }

        let block_start = self.clock_samples.load(Ordering::Relaxed) as f64 / self.sample_rate as f64;
        let block_end = block_start + out.len() as f64 / self.sample_rate as f64;

        // fire everything due inside this block, oldest first
        let mut due: Vec<(f64, TransportTask)> = Vec::new();
        self.pending.retain(|&(at, task)| {
            if at < block_end {
                due.push((at, task));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, task) in due {
            match task {
                TransportTask::Trigger {
                    frequency,
                    duration,
                } => self.trigger(frequency, duration),
                TransportTask::FinishPlayback => {
                    let _ = self.notice_tx.try_send(EngineNotice::PlaybackDone);
                }
            }
        }

        for voice in &mut self.voices {
            voice.render_into(out);
        }

        if let Some(filter) = &mut self.filter {
            filter.process(out);
        }
        if let Some(reverb) = &mut self.reverb {
            reverb.process(out);
        }
        if let Some(delay) = &mut self.delay {
            delay.process(out);
        }

        // output gain; an unwired or muted graph renders but stays silent
        let gain = if !self.connected || self.voice_config.mute {
            0.0
        } else {
            db_to_gain(self.voice_config.volume)
        };
        for frame in out.iter_mut() {
            frame.left *= gain;
            frame.right *= gain;
        }

        self.clock_samples
            .fetch_add(out.len() as u64, Ordering::Relaxed);
    }
}
