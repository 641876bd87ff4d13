use log::warn;

use crate::error::Result;
use crate::sequence::{NoteLength, Tone, generate_tones};
use crate::shared::{DEFAULT_OCTAVES, PlaybackContext};
use crate::synth::settings::{MAX_VOLUME_DB, MIN_VOLUME_DB};
use crate::synth::{SynthBackend, SynthManager, TrackSettings};

pub(crate) const DEFAULT_TITLE: &str = "Title";
pub(crate) const DEFAULT_COLOR: &str = "#FFFFFF";

/// One editable composition: the pitch lanes, their settings and the synth
/// graph that plays them.
///
/// Playback is a two-state machine, idle and playing; play presses restart
/// (stop, then start) and stop is always safe to call. Lane and settings
/// edits are picked up by the next play press, never mid-flight.
pub struct Track {
    title: String,
    color: String,
    volume: f32, // dB
    number_of_octaves: u32,
    tones: Vec<Tone>,
    settings: TrackSettings,
    manager: SynthManager,
    on_playback_stopped: Option<Box<dyn FnMut()>>,
    playing: bool,
}

impl Track {
    pub fn new(title: &str, color: &str, backend: Box<dyn SynthBackend>) -> Self {
        let settings = TrackSettings::default();
        let manager = SynthManager::new(backend, &settings);
        Self {
            title: coerce_title(title),
            color: color.to_string(),
            volume: 0.0,
            number_of_octaves: DEFAULT_OCTAVES,
            tones: generate_tones(DEFAULT_OCTAVES).expect("default octave count is valid"),
            settings,
            manager,
            on_playback_stopped: None,
            playing: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) -> &str {
        self.title = coerce_title(title);
        &self.title
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: &str) {
        self.color = color.to_string();
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Clamps to the dB range of the volume slider, returns the stored value.
    pub fn set_volume(&mut self, db: f32) -> f32 {
        self.volume = db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
        self.volume
    }

    pub fn number_of_octaves(&self) -> u32 {
        self.number_of_octaves
    }

    /// Resizes the lane set, carrying notes over by lane name. Counts the
    /// generator would reject fall back to the default instead.
    pub fn set_number_of_octaves(&mut self, count: u32) -> u32 {
        let count = if (1..=8).contains(&count) {
            count
        } else {
            warn!("octave count {count} out of range, using {DEFAULT_OCTAVES}");
            DEFAULT_OCTAVES
        };
        if count != self.number_of_octaves {
            let old = std::mem::take(&mut self.tones);
            self.number_of_octaves = count;
            self.tones = generate_tones(count).expect("octave count validated above");
            for tone in old {
                if let Some(row) = self.row_of(tone.name()) {
                    for (step, length) in tone.notes() {
                        self.tones[row].insert_note(step, length);
                    }
                }
            }
        }
        self.number_of_octaves
    }

    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    pub fn row_of(&self, name: &str) -> Option<usize> {
        self.tones.iter().position(|tone| tone.name() == name)
    }

    /// Paints a note. False when the row does not exist.
    pub fn insert_note(&mut self, row: usize, step: u32, length: NoteLength) -> bool {
        match self.tones.get_mut(row) {
            Some(tone) => {
                tone.insert_note(step, length);
                true
            }
            None => false,
        }
    }

    /// Erases the note starting at `step`. False when nothing was there.
    pub fn remove_note(&mut self, row: usize, step: u32) -> bool {
        self.tones
            .get_mut(row)
            .map(|tone| tone.remove_note(step))
            .unwrap_or(false)
    }

    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut TrackSettings {
        &mut self.settings
    }

    pub fn set_on_playback_stopped(&mut self, callback: impl FnMut() + 'static) {
        self.on_playback_stopped = Some(Box::new(callback));
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play_from_beginning(&mut self, ctx: &PlaybackContext) -> Result<()> {
        self.play_at(ctx, 0)
    }

    pub fn play_from_index(&mut self, ctx: &PlaybackContext) -> Result<()> {
        self.play_at(ctx, ctx.play_position())
    }

    fn play_at(&mut self, ctx: &PlaybackContext, start_index: u32) -> Result<()> {
        self.stop();
        self.manager.change_settings(&self.settings);
        // a device that cannot come back up means no playback at all
        self.manager.resume()?;
        self.manager.play(&self.tones, self.volume, ctx, start_index);
        self.playing = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.manager.stop_all();
        self.playing = false;
    }

    /// Drives the end-of-playback edge; call this from the event loop.
    pub fn poll(&mut self) {
        if self.playing && self.manager.poll_playback_stopped() {
            self.playing = false;
            if let Some(callback) = &mut self.on_playback_stopped {
                callback();
            }
        }
    }
}

fn coerce_title(title: &str) -> String {
    if title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("title", &self.title)
            .field("color", &self.color)
            .field("volume", &self.volume)
            .field("number_of_octaves", &self.number_of_octaves)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::synth::SharedVirtualBackend;

    fn track() -> (Track, SharedVirtualBackend) {
        let shared = SharedVirtualBackend::new();
        let track = Track::new("Test", "#FF00FF", Box::new(shared.clone()));
        (track, shared)
    }

    #[test]
    fn test_empty_title_coerces_to_default() {
        let (mut track, _) = track();
        assert_eq!(track.title(), "Test");
        track.set_title("   ");
        assert_eq!(track.title(), "Title");
    }

    #[test]
    fn test_volume_clamps_on_write() {
        let (mut track, _) = track();
        assert_eq!(track.set_volume(100.0), 32.0);
        assert_eq!(track.set_volume(-57.0), -32.0);
    }

    #[test]
    fn test_default_lane_count() {
        let (track, _) = track();
        assert_eq!(track.tones().len(), 60);
        assert_eq!(track.number_of_octaves(), 5);
    }

    #[test]
    fn test_octave_resize_carries_notes_by_name() {
        let (mut track, _) = track();
        let row = track.row_of("C4").unwrap();
        track.insert_note(row, 3, NoteLength::Quarter);
        track.set_number_of_octaves(1);
        assert_eq!(track.tones().len(), 12);
        let row = track.row_of("C4").unwrap();
        assert_eq!(track.tones()[row].note_at(3), Some(NoteLength::Quarter));
    }

    #[test]
    fn test_bad_octave_count_falls_back_to_default() {
        let (mut track, _) = track();
        track.set_number_of_octaves(3);
        assert_eq!(track.set_number_of_octaves(99), DEFAULT_OCTAVES);
    }

    #[test]
    fn test_play_then_finish_fires_callback() {
        let (mut track, shared) = track();
        let stopped = Rc::new(Cell::new(false));
        let flag = stopped.clone();
        track.set_on_playback_stopped(move || flag.set(true));

        let row = track.row_of("A4").unwrap();
        track.insert_note(row, 0, NoteLength::Sixteenth);
        let ctx = PlaybackContext::default();
        track.play_from_beginning(&ctx).unwrap();
        assert!(track.is_playing());

        shared.borrow_mut().advance(60.0);
        track.poll();
        assert!(!track.is_playing());
        assert!(stopped.get());
    }

    #[test]
    fn test_play_from_index_uses_the_cursor() {
        let (mut track, shared) = track();
        let row = track.row_of("A4").unwrap();
        track.insert_note(row, 0, NoteLength::Sixteenth);
        track.insert_note(row, 8, NoteLength::Sixteenth);

        let mut ctx = PlaybackContext::default();
        ctx.set_play_position(8);
        track.play_from_index(&ctx).unwrap();

        shared.borrow_mut().advance(60.0);
        // only the note at the cursor fires, the earlier one is skipped
        assert_eq!(shared.borrow().triggered.len(), 1);
    }

    #[test]
    fn test_restart_cancels_previous_playback() {
        let (mut track, shared) = track();
        let row = track.row_of("A4").unwrap();
        track.insert_note(row, 0, NoteLength::Whole);
        let ctx = PlaybackContext::default();

        track.play_from_beginning(&ctx).unwrap();
        track.play_from_beginning(&ctx).unwrap();
        shared.borrow_mut().advance(60.0);
        // one note plus one finish marker fired, not two of each
        assert_eq!(shared.borrow().triggered.len(), 1);
    }

    #[test]
    fn test_failed_resume_leaves_track_idle() {
        let (mut track, shared) = track();
        shared.borrow_mut().fail_resume = true;
        let ctx = PlaybackContext::default();
        assert!(track.play_from_beginning(&ctx).is_err());
        assert!(!track.is_playing());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut track, _) = track();
        track.stop();
        track.stop();
        assert!(!track.is_playing());
    }
}
