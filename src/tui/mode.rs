use gridtone::sequence::NoteLength;
use gridtone::shared::VISIBLE_STEPS;

// state local to the tui: the edit cursor, scroll offsets and the note
// length the next paint will use. the engine never sees any of this.
#[derive(Clone, Debug)]
pub struct TuiState {
    pub cursor_row: usize,
    pub cursor_step: u32,
    pub row_scroll: usize,
    pub step_scroll: u32,
    pub selected_length: NoteLength,
    // one-line feedback for saves and play failures
    pub status: Option<String>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            cursor_row: 0,
            cursor_step: 0,
            row_scroll: 0,
            step_scroll: 0,
            // the note palette starts on whole, like the old editor
            selected_length: NoteLength::Whole,
            status: None,
        }
    }
}

impl TuiState {
    pub fn move_cursor(&mut self, d_row: i32, d_step: i32, rows: usize) {
        let max_row = rows.saturating_sub(1) as i32;
        self.cursor_row = (self.cursor_row as i32 + d_row).clamp(0, max_row) as usize;
        self.cursor_step = (self.cursor_step as i32 + d_step).max(0) as u32;
    }

    /// Scrolls both axes so the cursor stays inside the visible window.
    pub fn follow_cursor(&mut self, visible_rows: usize) {
        if self.cursor_row < self.row_scroll {
            self.row_scroll = self.cursor_row;
        } else if visible_rows > 0 && self.cursor_row >= self.row_scroll + visible_rows {
            self.row_scroll = self.cursor_row - visible_rows + 1;
        }

        if self.cursor_step < self.step_scroll {
            self.step_scroll = self.cursor_step;
        } else if self.cursor_step >= self.step_scroll + VISIBLE_STEPS as u32 {
            self.step_scroll = self.cursor_step - VISIBLE_STEPS as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut ui = TuiState::default();
        ui.move_cursor(-5, -5, 60);
        assert_eq!((ui.cursor_row, ui.cursor_step), (0, 0));
        ui.move_cursor(100, 3, 60);
        assert_eq!((ui.cursor_row, ui.cursor_step), (59, 3));
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut ui = TuiState::default();
        ui.cursor_step = 40;
        ui.follow_cursor(20);
        assert_eq!(ui.step_scroll, 40 - VISIBLE_STEPS as u32 + 1);
        ui.cursor_step = 2;
        ui.follow_cursor(20);
        assert_eq!(ui.step_scroll, 2);
    }
}
