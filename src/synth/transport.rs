use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::audio_api::{EngineNotice, GraphConfig, TransportTask};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Started,
}

/// The shared clock every playback is scheduled against.
///
/// The clock only advances while started; starting an already running
/// transport is a no-op. Tasks are plain data, so implementations can live
/// on the far side of a channel.
pub trait Transport {
    /// Transport time in seconds.
    fn current_time(&self) -> f64;

    fn state(&self) -> TransportState;

    fn start(&mut self);

    /// Queue `task` to fire at absolute transport time `at`.
    fn schedule(&mut self, at: f64, task: TransportTask);

    /// Same queue, kept separate for one-shot markers like end-of-playback.
    fn schedule_once(&mut self, at: f64, task: TransportTask);

    /// Drop every scheduled-but-not-yet-fired task.
    fn cancel_all(&mut self);
}

/// A transport that also owns the synth graph on its side of the boundary.
pub trait SynthBackend: Transport {
    /// Build or rebuild the graph nodes to match `graph`.
    fn configure(&mut self, graph: GraphConfig);

    /// Wire voice -> filter? -> reverb? -> delay? -> output.
    fn connect(&mut self);

    fn disconnect(&mut self);

    /// Release every currently sounding voice.
    fn release_all(&mut self);

    /// Bring a suspended output device back up before playing.
    ///
    /// The cpal stream runs for the life of the process, so the default is
    /// a successful no-op; backends that can suspend override it.
    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Non-blocking poll for notices from the audio side.
    fn poll_notice(&mut self) -> Option<EngineNotice>;
}

/// Deterministic in-memory backend for tests and headless use.
///
/// Drive it with `advance`; fired triggers and graph calls are recorded so
/// tests can assert exactly what would have reached the audio engine.
#[derive(Debug, Default)]
pub struct VirtualBackend {
    clock: f64,
    started: bool,
    seq: u64,
    pending: Vec<(f64, u64, TransportTask)>,
    notices: VecDeque<EngineNotice>,
    /// Every fired Trigger as (time, frequency, duration).
    pub triggered: Vec<(f64, f32, f64)>,
    /// Every configure call in order.
    pub configures: Vec<GraphConfig>,
    pub connected: bool,
    /// Forces the next resume to fail, for the suspended-device path.
    pub fail_resume: bool,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and fires everything that came due, in
    /// (time, insertion) order.
    pub fn advance(&mut self, dt: f64) {
        if !self.started {
            return;
        }
        self.clock += dt;

        let mut due: Vec<(f64, u64, TransportTask)> = Vec::new();
        self.pending.retain(|&(at, seq, task)| {
            if at <= self.clock {
                due.push((at, seq, task));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, _, task) in due {
            match task {
                TransportTask::Trigger {
                    frequency,
                    duration,
                } => self.triggered.push((self.clock, frequency, duration)),
                TransportTask::FinishPlayback => self.notices.push_back(EngineNotice::PlaybackDone),
            }
        }
    }
}

impl Transport for VirtualBackend {
    fn current_time(&self) -> f64 {
        self.clock
    }

    fn state(&self) -> TransportState {
        if self.started {
            TransportState::Started
        } else {
            TransportState::Stopped
        }
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn schedule(&mut self, at: f64, task: TransportTask) {
        self.seq += 1;
        self.pending.push((at, self.seq, task));
    }

    fn schedule_once(&mut self, at: f64, task: TransportTask) {
        self.schedule(at, task);
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

impl SynthBackend for VirtualBackend {
    fn configure(&mut self, graph: GraphConfig) {
        self.configures.push(graph);
    }

    fn connect(&mut self) {
        self.connected = true;
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn release_all(&mut self) {}

    fn resume(&mut self) -> Result<()> {
        if self.fail_resume {
            Err(crate::error::Error::AudioUnavailable(
                "virtual device suspended".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn poll_notice(&mut self) -> Option<EngineNotice> {
        self.notices.pop_front()
    }
}

/// Shareable handle around a [`VirtualBackend`].
///
/// A manager owns its backend box, so a test that wants to advance the
/// clock or inspect fired triggers keeps a clone of this handle and hands
/// the other clone to the manager.
#[derive(Clone, Debug, Default)]
pub struct SharedVirtualBackend(Rc<RefCell<VirtualBackend>>);

impl SharedVirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, VirtualBackend> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, VirtualBackend> {
        self.0.borrow_mut()
    }
}

impl Transport for SharedVirtualBackend {
    fn current_time(&self) -> f64 {
        self.0.borrow().current_time()
    }

    fn state(&self) -> TransportState {
        self.0.borrow().state()
    }

    fn start(&mut self) {
        self.0.borrow_mut().start();
    }

    fn schedule(&mut self, at: f64, task: TransportTask) {
        self.0.borrow_mut().schedule(at, task);
    }

    fn schedule_once(&mut self, at: f64, task: TransportTask) {
        self.0.borrow_mut().schedule_once(at, task);
    }

    fn cancel_all(&mut self) {
        self.0.borrow_mut().cancel_all();
    }
}

impl SynthBackend for SharedVirtualBackend {
    fn configure(&mut self, graph: GraphConfig) {
        self.0.borrow_mut().configure(graph);
    }

    fn connect(&mut self) {
        self.0.borrow_mut().connect();
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().disconnect();
    }

    fn release_all(&mut self) {
        self.0.borrow_mut().release_all();
    }

    fn resume(&mut self) -> Result<()> {
        self.0.borrow_mut().resume()
    }

    fn poll_notice(&mut self) -> Option<EngineNotice> {
        self.0.borrow_mut().poll_notice()
    }
}
