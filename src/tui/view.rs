use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use gridtone::sequence::Tone;
use gridtone::shared::{PlaybackContext, VISIBLE_STEPS};
use gridtone::Track;

use super::mode::TuiState;

const LABEL_WIDTH: u16 = 5;
const CELL_WIDTH: u16 = 2;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    track: &Track,
    ui: &mut TuiState,
    ctx: &PlaybackContext,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title + transport line
            Constraint::Min(4),    // the grid
            Constraint::Length(1), // key help
        ])
        .split(area);

    ui.follow_cursor(sections[1].height as usize);

    draw_header(frame, sections[0], track, ui, ctx);
    draw_grid(frame, sections[1], track, ui, ctx);
    draw_help(frame, sections[2]);
}

fn draw_header(frame: &mut Frame, area: Rect, track: &Track, ui: &TuiState, ctx: &PlaybackContext) {
    let accent = hex_color(track.color());
    let mut top = vec![
        Span::styled(
            track.title().to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    if track.is_playing() {
        top.push(Span::styled("▶ playing", Style::default().fg(Color::Green)));
    } else {
        top.push(Span::styled("■ stopped", Style::default().fg(Color::DarkGray)));
    }
    if track.settings().is_mute() {
        top.push(Span::raw("  "));
        top.push(Span::styled("muted", Style::default().fg(Color::Red)));
    }

    let mut bottom = format!(
        "vol {:+.0} dB · {} bpm · note: {} · step {}",
        track.volume(),
        ctx.bpm(),
        ui.selected_length.label(),
        ui.cursor_step,
    );
    if let Some(status) = &ui.status {
        bottom.push_str(" · ");
        bottom.push_str(status);
    }

    let lines = vec![
        Line::from(top),
        Line::from(Span::styled(bottom, Style::default().fg(Color::Gray))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_grid(frame: &mut Frame, area: Rect, track: &Track, ui: &TuiState, ctx: &PlaybackContext) {
    let accent = hex_color(track.color());
    // a beat is four sixteenth steps; a measure is beats() of those
    let measure_steps = ctx.beats() * 4;
    let cols = (((area.width.saturating_sub(LABEL_WIDTH)) / CELL_WIDTH) as usize)
        .min(VISIBLE_STEPS) as u32;

    let mut lines = Vec::new();
    let visible = track
        .tones()
        .iter()
        .enumerate()
        .skip(ui.row_scroll)
        .take(area.height as usize);

    for (row, tone) in visible {
        let mut spans = Vec::with_capacity(cols as usize + 1);
        // octave divider under every B -> C boundary, like the old matrix
        let label_style = if (row + 1) % 12 == 0 {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("{:>4} ", tone.name()), label_style));

        for step in ui.step_scroll..ui.step_scroll + cols {
            let is_cursor = row == ui.cursor_row && step == ui.cursor_step;
            let (text, mut style) = match cell_at(tone, step) {
                Cell::Start => ("▓▓", Style::default().fg(accent)),
                Cell::Sustain => ("▒▒", Style::default().fg(accent)),
                Cell::Empty => {
                    // measure and beat guides, like the old matrix borders
                    if step % measure_steps == 0 {
                        ("¦ ", Style::default().fg(Color::Gray))
                    } else if step % 4 == 0 {
                        ("· ", Style::default().fg(Color::Gray))
                    } else {
                        ("· ", Style::default().fg(Color::DarkGray))
                    }
                }
            };
            if is_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = "arrows move · enter paint · x erase · 1-5 length · space play · p play@cursor · [/] bpm · m mute · +/- vol · s save · esc quit";
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}

enum Cell {
    Start,
    Sustain,
    Empty,
}

fn cell_at(tone: &Tone, step: u32) -> Cell {
    if tone.note_at(step).is_some() {
        return Cell::Start;
    }
    for (start, length) in tone.notes() {
        if start > step {
            break;
        }
        if start + length.steps() > step {
            return Cell::Sustain;
        }
    }
    Cell::Empty
}

fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() == 6 {
        if let Ok(v) = u32::from_str_radix(digits, 16) {
            return Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8);
        }
    }
    Color::Magenta
}
