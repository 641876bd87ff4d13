use log::debug;

use crate::audio_api::{
    DelayConfig, EngineNotice, FilterConfig, GraphConfig, ReverbConfig, TransportTask, VoiceConfig,
};
use crate::error::Result;
use crate::sequence::{Tone, order_tones};
use crate::shared::PlaybackContext;

use super::settings::{MAX_VOLUME_DB, MIN_VOLUME_DB, TrackSettings};
use super::slot::{EffectSlot, SlotTransition};
use super::transport::{SynthBackend, TransportState};

/// Seconds added to the transport clock before the first scheduled note,
/// so the engine never has to fire something already in the past.
pub const SCHEDULE_LOOKAHEAD: f64 = 0.5;

/// Owns the synth graph: one polyphonic voice and up to one each of
/// filter / reverb / delay, wired to the output while playing.
///
/// The manager mirrors the graph as plain configs and slots; the actual
/// nodes live behind the [`SynthBackend`] so everything here stays
/// deterministic and testable.
pub struct SynthManager {
    backend: Box<dyn SynthBackend>,
    voice: VoiceConfig,
    filter: EffectSlot<FilterConfig>,
    reverb: EffectSlot<ReverbConfig>,
    delay: EffectSlot<DelayConfig>,
}

impl SynthManager {
    /// Builds the graph from the settings. Safe to call on a backend that
    /// already holds nodes; configure replaces them wholesale.
    pub fn new(backend: Box<dyn SynthBackend>, settings: &TrackSettings) -> Self {
        let mut manager = Self {
            backend,
            voice: voice_config(settings),
            filter: EffectSlot::Absent,
            reverb: EffectSlot::Absent,
            delay: EffectSlot::Absent,
        };
        manager.change_settings(settings);
        manager
    }

    /// Live-updates the graph from the settings: voice parameters always,
    /// and per effect the absent / present-matching / present-stale
    /// transition (create, leave, mutate, or dispose).
    pub fn change_settings(&mut self, settings: &TrackSettings) {
        self.voice = voice_config(settings);

        let filter = self.filter.reconcile(filter_config(settings));
        let reverb = self
            .reverb
            .reconcile(settings.reverb_amount().map(|amount| ReverbConfig { amount }));
        let delay = self
            .delay
            .reconcile(settings.delay_time().map(|time| DelayConfig { time }));
        for (name, transition) in [("filter", filter), ("reverb", reverb), ("delay", delay)] {
            if transition != SlotTransition::Unchanged {
                debug!("{name}: {transition:?}");
            }
        }

        self.push_graph();
    }

    /// Mirrors the current voice and effect slots into a [`GraphConfig`] and
    /// hands it to the backend to build or rebuild the graph nodes.
    fn push_graph(&mut self) {
        self.backend.configure(GraphConfig {
            voice: self.voice,
            filter: self.filter.to_option(),
            reverb: self.reverb.to_option(),
            delay: self.delay.to_option(),
        });
    }

    /// See [`SynthBackend::resume`]. The composition calls this before play.
    pub fn resume(&mut self) -> Result<()> {
        self.backend.resume()
    }

    /// Schedules every note of `tones` from `start_index` onward and arms
    /// the end-of-playback notice. Returns the absolute end time.
    pub fn play(
        &mut self,
        tones: &[Tone],
        volume: f32,
        ctx: &PlaybackContext,
        start_index: u32,
    ) -> f64 {
        // the play-time volume wins over whatever the settings carried
        self.voice.volume = volume.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
        self.push_graph();
        self.backend.connect();

        let now = self.backend.current_time() + SCHEDULE_LOOKAHEAD;
        let step_seconds = ctx.step_seconds();
        let schedule = order_tones(tones, now, start_index, step_seconds);
        debug!(
            "playing {} notes at {} bpm, done at {:.3}s",
            schedule.notes.len(),
            ctx.bpm(),
            schedule.end_time
        );

        for note in &schedule.notes {
            self.backend.schedule(
                note.time,
                TransportTask::Trigger {
                    frequency: note.frequency,
                    duration: note.duration_seconds(step_seconds),
                },
            );
        }
        self.backend
            .schedule_once(schedule.end_time, TransportTask::FinishPlayback);

        if self.backend.state() != TransportState::Started {
            self.backend.start();
        }
        schedule.end_time
    }

    /// Releases sounding voices, drops every pending task and unwires the
    /// graph from the output.
    pub fn stop_all(&mut self) {
        self.backend.release_all();
        self.backend.cancel_all();
        self.backend.disconnect();
    }

    /// True once the end-of-playback notice for the last play has fired.
    pub fn poll_playback_stopped(&mut self) -> bool {
        matches!(self.backend.poll_notice(), Some(EngineNotice::PlaybackDone))
    }
}

fn voice_config(settings: &TrackSettings) -> VoiceConfig {
    VoiceConfig {
        wave: settings.wave(),
        detune: settings.detune(),
        attack: settings.attack(),
        decay: settings.decay(),
        sustain: settings.sustain(),
        release: settings.release(),
        volume: settings.volume(),
        mute: settings.is_mute(),
    }
}

fn filter_config(settings: &TrackSettings) -> Option<FilterConfig> {
    settings.filter().map(|kind| FilterConfig {
        kind,
        cutoff: settings.cutoff(),
        q: settings.q(),
        rolloff: settings.rolloff(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::NoteLength;
    use crate::synth::settings::{FilterKind, WaveType};
    use crate::synth::transport::{SharedVirtualBackend, Transport};

    fn lane_with(notes: &[(u32, NoteLength)]) -> Vec<Tone> {
        let mut tone = Tone::new("A4", 440.0);
        for &(step, len) in notes {
            tone.insert_note(step, len);
        }
        vec![tone]
    }

    fn manager_with_defaults() -> (SynthManager, SharedVirtualBackend) {
        let shared = SharedVirtualBackend::new();
        let manager = SynthManager::new(Box::new(shared.clone()), &TrackSettings::default());
        (manager, shared)
    }

    #[test]
    fn test_build_pushes_voice_without_effects() {
        let (_, shared) = manager_with_defaults();
        let backend = shared.borrow();
        assert_eq!(backend.configures.len(), 1);
        let graph = &backend.configures[0];
        assert_eq!(graph.voice.wave, WaveType::Sine);
        assert!(graph.filter.is_none());
        assert!(graph.reverb.is_none());
        assert!(graph.delay.is_none());
    }

    #[test]
    fn test_change_settings_creates_and_disposes_effects() {
        let (mut manager, shared) = manager_with_defaults();
        let mut settings = TrackSettings::default();
        settings.set_filter(Some(FilterKind::Lowpass));
        settings.set_reverb_amount(Some(0.4));
        manager.change_settings(&settings);
        {
            let backend = shared.borrow();
            let graph = backend.configures.last().unwrap();
            assert_eq!(graph.filter.unwrap().kind, FilterKind::Lowpass);
            assert_eq!(graph.reverb.unwrap().amount, 0.4);
            assert!(graph.delay.is_none());
        }

        settings.set_filter(None);
        manager.change_settings(&settings);
        let backend = shared.borrow();
        assert!(backend.configures.last().unwrap().filter.is_none());
        assert!(backend.configures.last().unwrap().reverb.is_some());
    }

    #[test]
    fn test_play_schedules_and_fires() {
        let (mut manager, shared) = manager_with_defaults();
        let tones = lane_with(&[(0, NoteLength::Quarter), (4, NoteLength::Quarter)]);
        let ctx = PlaybackContext::default();

        let end = manager.play(&tones, 0.0, &ctx, 0);
        // two notes plus the finish marker are pending, graph is wired
        assert_eq!(shared.borrow().pending_len(), 3);
        assert!(shared.borrow().connected);
        assert!((end - (0.5 + 8.0 * 0.125)).abs() < 1e-9);

        shared.borrow_mut().advance(end + 0.1);
        assert_eq!(shared.borrow().triggered.len(), 2);
        assert!(manager.poll_playback_stopped());
    }

    #[test]
    fn test_play_applies_volume_override() {
        let (mut manager, shared) = manager_with_defaults();
        let ctx = PlaybackContext::default();
        manager.play(&[], 99.0, &ctx, 0);
        // clamped to the dB ceiling before it reaches the engine
        assert_eq!(shared.borrow().configures.last().unwrap().voice.volume, 32.0);
    }

    #[test]
    fn test_stop_all_cancels_pending() {
        let (mut manager, shared) = manager_with_defaults();
        let tones = lane_with(&[(0, NoteLength::Whole)]);
        let ctx = PlaybackContext::default();

        manager.play(&tones, 0.0, &ctx, 0);
        manager.stop_all();
        assert!(!shared.borrow().connected);

        shared.borrow_mut().advance(60.0);
        // a cancelled playback never fires anything afterwards
        assert!(shared.borrow().triggered.is_empty());
        assert!(!manager.poll_playback_stopped());
    }

    #[test]
    fn test_stop_then_play_only_fires_new_events() {
        let (mut manager, shared) = manager_with_defaults();
        let ctx = PlaybackContext::default();
        manager.play(&lane_with(&[(0, NoteLength::Quarter)]), 0.0, &ctx, 0);
        manager.stop_all();
        manager.play(&lane_with(&[(2, NoteLength::Eighth)]), 0.0, &ctx, 0);

        shared.borrow_mut().advance(120.0);
        let backend = shared.borrow();
        assert_eq!(backend.triggered.len(), 1);
        // the eighth lasts 2 steps = 0.25s
        assert!((backend.triggered[0].2 - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_playback_finishes_at_now() {
        let (mut manager, shared) = manager_with_defaults();
        let ctx = PlaybackContext::default();
        let end = manager.play(&[], 0.0, &ctx, 0);
        assert_eq!(end, SCHEDULE_LOOKAHEAD);
        shared.borrow_mut().advance(1.0);
        assert!(manager.poll_playback_stopped());
    }

    #[test]
    fn test_transport_start_is_idempotent() {
        let (mut manager, shared) = manager_with_defaults();
        let ctx = PlaybackContext::default();
        manager.play(&[], 0.0, &ctx, 0);
        shared.borrow_mut().advance(1.0);
        let before = shared.borrow().current_time();
        // second play while the transport is running must not reset the clock
        manager.play(&[], 0.0, &ctx, 0);
        assert_eq!(shared.borrow().current_time(), before);
    }
}
