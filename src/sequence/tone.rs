use std::collections::BTreeMap;

use super::NoteLength;

/// One pitch lane: a fixed name + frequency and a sparse map of note starts.
///
/// The map is keyed by grid step, so at most one note starts on a given step
/// of a lane; the BTreeMap keeps traversal ordered for the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct Tone {
    name: String,
    frequency: f32,
    unit_blocks: BTreeMap<u32, NoteLength>,
}

impl Tone {
    pub fn new(name: impl Into<String>, frequency: f32) -> Self {
        Self {
            name: name.into(),
            frequency,
            unit_blocks: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Inserts or replaces the note starting at `step`.
    pub fn insert_note(&mut self, step: u32, length: NoteLength) {
        self.unit_blocks.insert(step, length);
    }

    /// Removes the note starting at `step`. False when nothing was there.
    pub fn remove_note(&mut self, step: u32) -> bool {
        self.unit_blocks.remove(&step).is_some()
    }

    pub fn note_at(&self, step: u32) -> Option<NoteLength> {
        self.unit_blocks.get(&step).copied()
    }

    /// All note starts in ascending step order.
    pub fn notes(&self) -> impl Iterator<Item = (u32, NoteLength)> + '_ {
        self.unit_blocks.iter().map(|(&step, &len)| (step, len))
    }

    pub fn is_empty(&self) -> bool {
        self.unit_blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.unit_blocks.clear();
    }

    /// Highest occupied step plus its length, for sizing the visible grid.
    pub fn extent(&self) -> u32 {
        self.unit_blocks
            .iter()
            .next_back()
            .map(|(&step, &len)| step + len.steps())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_remove() {
        let mut tone = Tone::new("C4", 261.63);
        tone.insert_note(3, NoteLength::Quarter);
        assert_eq!(tone.note_at(3), Some(NoteLength::Quarter));
        assert!(tone.remove_note(3));
        assert_eq!(tone.note_at(3), None);
        assert!(tone.is_empty());
    }

    #[test]
    fn test_remove_absent_reports_not_found() {
        let mut tone = Tone::new("C4", 261.63);
        tone.insert_note(1, NoteLength::Half);
        assert!(!tone.remove_note(7));
        // the miss must leave the map alone
        assert_eq!(tone.note_at(1), Some(NoteLength::Half));
    }

    #[test]
    fn test_insert_replaces_at_same_step() {
        let mut tone = Tone::new("A4", 440.0);
        tone.insert_note(0, NoteLength::Whole);
        tone.insert_note(0, NoteLength::Sixteenth);
        assert_eq!(tone.note_at(0), Some(NoteLength::Sixteenth));
        assert_eq!(tone.notes().count(), 1);
    }

    #[test]
    fn test_notes_iterate_in_step_order() {
        let mut tone = Tone::new("A4", 440.0);
        tone.insert_note(9, NoteLength::Eighth);
        tone.insert_note(2, NoteLength::Quarter);
        tone.insert_note(17, NoteLength::Sixteenth);
        let steps: Vec<u32> = tone.notes().map(|(s, _)| s).collect();
        assert_eq!(steps, vec![2, 9, 17]);
    }

    #[test]
    fn test_extent() {
        let mut tone = Tone::new("A4", 440.0);
        assert_eq!(tone.extent(), 0);
        tone.insert_note(10, NoteLength::Whole);
        tone.insert_note(2, NoteLength::Sixteenth);
        assert_eq!(tone.extent(), 26);
    }
}
