mod tui;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use gridtone::shared::InputEvent;
use gridtone::{PlaybackContext, Track, audio, pipeline};

use tui::mode::TuiState;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let audio = audio::start_audio()?;

    let path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("track.json"));

    let mut track = if path.exists() {
        match pipeline::load_track(&path, Box::new(audio.transport())) {
            Ok(track) => track,
            Err(e) => {
                eprintln!("could not load {}: {e}", path.display());
                Track::new("", "#FFFFFF", Box::new(audio.transport()))
            }
        }
    } else {
        Track::new("", "#FFFFFF", Box::new(audio.transport()))
    };

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let mut ctx = PlaybackContext::default();
    let mut ui = TuiState::default();
    let tick_rate = Duration::from_millis(16); // ~60fps

    loop {
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &track, &mut ui, &ctx);
        })?;

        let events = tui::input::poll_input(tick_rate)?;
        for event in events {
            if event == InputEvent::Quit {
                // save before quitting
                let _ = pipeline::save_track(&path, &track);
                track.stop();
                drop(term);
                return Ok(());
            }
            apply_event(event, &mut track, &mut ctx, &mut ui, &path);
        }

        // lets the track notice its playback finished
        track.poll();
    }
}

fn apply_event(
    event: InputEvent,
    track: &mut Track,
    ctx: &mut PlaybackContext,
    ui: &mut TuiState,
    path: &std::path::Path,
) {
    ui.status = None;
    match event {
        InputEvent::MoveCursor(d_row, d_step) => {
            ui.move_cursor(d_row, d_step, track.tones().len());
        }
        InputEvent::JumpOctave(direction) => {
            ui.move_cursor(direction * 12, 0, track.tones().len());
        }
        InputEvent::PaintNote => {
            track.insert_note(ui.cursor_row, ui.cursor_step, ui.selected_length);
        }
        InputEvent::EraseNote => {
            track.remove_note(ui.cursor_row, ui.cursor_step);
        }
        InputEvent::SelectLength(length) => ui.selected_length = length,
        InputEvent::PlayPress => {
            if track.is_playing() {
                track.stop();
            } else if let Err(e) = track.play_from_beginning(ctx) {
                ui.status = Some(format!("play failed: {e}"));
            }
        }
        InputEvent::PlayFromCursor => {
            ctx.set_play_position(ui.cursor_step);
            if let Err(e) = track.play_from_index(ctx) {
                ui.status = Some(format!("play failed: {e}"));
            }
        }
        InputEvent::AdjustBpm(delta) => {
            let bpm = ctx.set_bpm(ctx.bpm() + delta);
            ui.status = Some(format!("{bpm} bpm"));
        }
        InputEvent::AdjustVolume(delta) => {
            let volume = track.set_volume(track.volume() + delta);
            ui.status = Some(format!("volume {volume:+.0} dB"));
        }
        InputEvent::ToggleMute => {
            let mute = !track.settings().is_mute();
            track.settings_mut().set_mute(mute);
        }
        InputEvent::Save => match pipeline::save_track(path, track) {
            Ok(()) => ui.status = Some(format!("saved {}", path.display())),
            Err(e) => ui.status = Some(format!("save failed: {e}")),
        },
        InputEvent::Quit => {}
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
