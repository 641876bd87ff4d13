use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use gridtone::sequence::NoteLength;
use gridtone::shared::InputEvent;

// poll for input and resolve key presses into semantic events; main.rs
// applies them to the track / context / ui state
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Char('p') => vec![InputEvent::PlayFromCursor],

        KeyCode::Up => vec![InputEvent::MoveCursor(-1, 0)],
        KeyCode::Down => vec![InputEvent::MoveCursor(1, 0)],
        KeyCode::Left => vec![InputEvent::MoveCursor(0, -1)],
        KeyCode::Right => vec![InputEvent::MoveCursor(0, 1)],
        KeyCode::PageUp => vec![InputEvent::JumpOctave(-1)],
        KeyCode::PageDown => vec![InputEvent::JumpOctave(1)],

        // paint with the selected length; erase is the old right-click
        KeyCode::Enter => vec![InputEvent::PaintNote],
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('x') => vec![InputEvent::EraseNote],

        // note palette, shortest to longest
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            vec![InputEvent::SelectLength(NoteLength::ALL[idx])]
        }

        // tempo knob
        KeyCode::Char('[') => vec![InputEvent::AdjustBpm(-5.0)],
        KeyCode::Char(']') => vec![InputEvent::AdjustBpm(5.0)],

        KeyCode::Char('+') | KeyCode::Char('=') => vec![InputEvent::AdjustVolume(1.0)],
        KeyCode::Char('-') => vec![InputEvent::AdjustVolume(-1.0)],
        KeyCode::Char('m') => vec![InputEvent::ToggleMute],
        KeyCode::Char('s') => vec![InputEvent::Save],

        _ => vec![],
    }
}
