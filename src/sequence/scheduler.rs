use log::trace;

use super::Tone;

/// One note resolved to absolute transport time.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledNote {
    /// Absolute transport time in seconds.
    pub time: f64,
    /// Lane name, e.g. "C4". Kept for logging and debugging.
    pub name: String,
    pub frequency: f32,
    /// Sounding length in grid steps. Full length for notes at or after the
    /// cursor, the remaining overlap for carried notes.
    pub steps: u32,
}

impl ScheduledNote {
    pub fn duration_seconds(&self, step_seconds: f64) -> f64 {
        self.steps as f64 * step_seconds
    }
}

/// The flattened, time-ordered playback plan for one play press.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    pub notes: Vec<ScheduledNote>,
    /// When the last note stops sounding; `now` when there is nothing to play.
    pub end_time: f64,
}

/// Flattens every lane into one absolute-time ordered note list.
///
/// Notes at or after `start_index` play at their grid position relative to
/// `now`. A note that started before the cursor is carried over when its
/// sounding extent still overlaps the cursor: it plays immediately, cut down
/// to the remaining steps. Everything else is skipped.
///
/// The sort is stable, so simultaneous notes keep lane order (row 0 first),
/// and within a lane ascending step order. Pure function of its inputs.
pub fn order_tones(tones: &[Tone], now: f64, start_index: u32, step_seconds: f64) -> Schedule {
    let mut notes = Vec::new();

    for tone in tones {
        for (step, length) in tone.notes() {
            let scheduled = if step >= start_index {
                ScheduledNote {
                    time: now + (step - start_index) as f64 * step_seconds,
                    name: tone.name().to_string(),
                    frequency: tone.frequency(),
                    steps: length.steps(),
                }
            } else if step + length.steps() > start_index {
                // carried note: already sounding at the cursor
                ScheduledNote {
                    time: now,
                    name: tone.name().to_string(),
                    frequency: tone.frequency(),
                    steps: step + length.steps() - start_index,
                }
            } else {
                continue;
            };
            trace!(
                "scheduled {} at {:.3}s for {} steps",
                scheduled.name, scheduled.time, scheduled.steps
            );
            notes.push(scheduled);
        }
    }

    // stable by construction of sort_by, ties keep lane/step insertion order
    notes.sort_by(|a, b| a.time.total_cmp(&b.time));

    let end_time = notes
        .iter()
        .map(|n| n.time + n.duration_seconds(step_seconds))
        .fold(now, f64::max);

    Schedule { notes, end_time }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{NoteLength, Tone};

    const STEP: f64 = 0.125; // 120 bpm

    // RUST_LOG=trace shows every scheduling decision
    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn lane(name: &str, freq: f32, notes: &[(u32, NoteLength)]) -> Tone {
        let mut tone = Tone::new(name, freq);
        for &(step, len) in notes {
            tone.insert_note(step, len);
        }
        tone
    }

    #[test]
    fn test_empty_tracks_schedule_nothing() {
        let tones = vec![Tone::new("C4", 261.63)];
        let schedule = order_tones(&tones, 2.0, 0, STEP);
        assert!(schedule.notes.is_empty());
        assert_eq!(schedule.end_time, 2.0);
    }

    #[test]
    fn test_notes_offset_from_now() {
        let tones = vec![lane(
            "C4",
            261.63,
            &[(0, NoteLength::Quarter), (6, NoteLength::Eighth)],
        )];
        let schedule = order_tones(&tones, 1.0, 0, STEP);
        assert_eq!(schedule.notes.len(), 2);
        assert_eq!(schedule.notes[0].time, 1.0);
        assert_eq!(schedule.notes[0].steps, 4);
        assert_eq!(schedule.notes[1].time, 1.0 + 6.0 * STEP);
        // end = start of second note + 2 steps
        assert!((schedule.end_time - (1.0 + 8.0 * STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_play_from_cursor_shifts_indices() {
        let tones = vec![lane("C4", 261.63, &[(10, NoteLength::Sixteenth)])];
        let schedule = order_tones(&tones, 0.5, 8, STEP);
        assert_eq!(schedule.notes.len(), 1);
        assert!((schedule.notes[0].time - (0.5 + 2.0 * STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_carry_over_shortens_and_plays_immediately() {
        // whole note at step 10, cursor at 14: 12 steps still to sound
        let tones = vec![lane("C4", 261.63, &[(10, NoteLength::Whole)])];
        let schedule = order_tones(&tones, 3.0, 14, STEP);
        assert_eq!(schedule.notes.len(), 1);
        let note = &schedule.notes[0];
        assert_eq!(note.time, 3.0);
        assert_eq!(note.steps, 12);
        assert!((schedule.end_time - (3.0 + 12.0 * STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_expired_notes_are_skipped() {
        // quarter at step 2 is done by step 6, eighth at 5 still overlaps
        let tones = vec![lane(
            "C4",
            261.63,
            &[(2, NoteLength::Quarter), (5, NoteLength::Eighth)],
        )];
        let schedule = order_tones(&tones, 0.0, 6, STEP);
        assert_eq!(schedule.notes.len(), 1);
        assert_eq!(schedule.notes[0].steps, 1);
        assert_eq!(schedule.notes[0].time, 0.0);
    }

    #[test]
    fn test_boundary_note_ending_at_cursor_is_not_carried() {
        // quarter at step 0 covers steps 0..4, cursor at 4: no overlap left
        let tones = vec![lane("C4", 261.63, &[(0, NoteLength::Quarter)])];
        let schedule = order_tones(&tones, 0.0, 4, STEP);
        assert!(schedule.notes.is_empty());
    }

    #[test]
    fn test_ties_keep_row_order() {
        let tones = vec![
            lane("B4", 493.88, &[(3, NoteLength::Quarter)]),
            lane("E4", 329.63, &[(3, NoteLength::Quarter)]),
            lane("C4", 261.63, &[(3, NoteLength::Quarter)]),
        ];
        let schedule = order_tones(&tones, 0.0, 0, STEP);
        let names: Vec<&str> = schedule.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["B4", "E4", "C4"]);
    }

    #[test]
    fn test_sorted_by_time_across_lanes() {
        let tones = vec![
            lane("B4", 493.88, &[(8, NoteLength::Quarter)]),
            lane("C4", 261.63, &[(0, NoteLength::Quarter)]),
        ];
        let schedule = order_tones(&tones, 0.0, 0, STEP);
        let names: Vec<&str> = schedule.notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["C4", "B4"]);
    }

    #[test]
    fn test_idempotent() {
        init_logs();
        let tones = vec![
            lane("B4", 493.88, &[(0, NoteLength::Whole), (20, NoteLength::Eighth)]),
            lane("C4", 261.63, &[(4, NoteLength::Quarter)]),
        ];
        let first = order_tones(&tones, 1.5, 2, STEP);
        let second = order_tones(&tones, 1.5, 2, STEP);
        assert_eq!(first, second);
    }
}
