use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, EngineNotice, GraphConfig, TransportTask};
use crate::synth::{SynthBackend, Transport, TransportState};

mod effect;
mod engine;
mod frame;
mod voice;

pub use frame::StereoFrame;

use engine::Engine;

/// Keeps the cpal stream alive; drop it and the audio thread goes away.
pub struct AudioHandle {
    transport: AudioTransport,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    /// A Send handle the synth manager can own; clones share the engine.
    pub fn transport(&self) -> AudioTransport {
        self.transport.clone()
    }
}

/// The editing-side half of the engine: commands out, notices in, and the
/// shared sample clock for transport time.
#[derive(Clone)]
pub struct AudioTransport {
    tx: Sender<AudioCommand>,
    notice_rx: Receiver<EngineNotice>,
    clock_samples: Arc<AtomicU64>,
    sample_rate: f32,
    started: bool,
}

impl AudioTransport {
    fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}

impl Transport for AudioTransport {
    fn current_time(&self) -> f64 {
        self.clock_samples.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn state(&self) -> TransportState {
        if self.started {
            TransportState::Started
        } else {
            TransportState::Stopped
        }
    }

    fn start(&mut self) {
        // engine side is idempotent too, the mirror is just for state()
        self.started = true;
        self.send(AudioCommand::Start);
    }

    fn schedule(&mut self, at: f64, task: TransportTask) {
        self.send(AudioCommand::Schedule { at, task });
    }

    fn schedule_once(&mut self, at: f64, task: TransportTask) {
        self.send(AudioCommand::Schedule { at, task });
    }

    fn cancel_all(&mut self) {
        self.send(AudioCommand::CancelScheduled);
    }
}

impl SynthBackend for AudioTransport {
    fn configure(&mut self, graph: GraphConfig) {
        self.send(AudioCommand::Configure(graph));
    }

    fn connect(&mut self) {
        self.send(AudioCommand::Connect);
    }

    fn disconnect(&mut self) {
        self.send(AudioCommand::Disconnect);
    }

    fn release_all(&mut self) {
        self.send(AudioCommand::ReleaseAll);
    }

    fn poll_notice(&mut self) -> Option<EngineNotice> {
        self.notice_rx.try_recv().ok()
    }
}

/// Opens the default output device and parks an [`Engine`] in its callback.
pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(4096);
    let (notice_tx, notice_rx) = crossbeam_channel::bounded::<EngineNotice>(16);
    let clock_samples = Arc::new(AtomicU64::new(0));

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(
                &device,
                &config.into(),
                rx,
                notice_tx,
                clock_samples.clone(),
                sample_rate,
                channels,
            )?;
            output_stream
                .play()
                .context("failed to play output stream")?;

            Ok(AudioHandle {
                transport: AudioTransport {
                    tx,
                    notice_rx,
                    clock_samples,
                    sample_rate,
                    started: false,
                },
                _output_stream: output_stream,
            })
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    notice_tx: Sender<EngineNotice>,
    clock_samples: Arc<AtomicU64>,
    sample_rate: f32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate, clock_samples, notice_tx);
    let mut scratch: Vec<StereoFrame> = Vec::new();

    let err_fn = |err| eprintln!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            scratch.resize(n_frames, StereoFrame::zero());
            engine.render_block(&mut scratch);

            // interleave back out; anything past stereo stays silent
            for (frame, out) in scratch.iter().zip(data.chunks_mut(channels)) {
                out[0] = frame.left;
                if channels > 1 {
                    out[1] = frame.right;
                }
                for extra in out.iter_mut().skip(2) {
                    *extra = 0.0;
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
