//! Keyboard strip widget
//!
//! One cell per mapped physical key, lit while its note sounds. The note
//! numbers under each key shift with the octave offset, and the title shows
//! the playable range cue from `mapped_note_range`.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use keywave::pitch;

use super::ViewState;

pub fn render_keyboard(frame: &mut Frame, area: Rect, view: &ViewState) {
    let offset = view.params.octave_offset;

    let mut key_spans: Vec<Span> = Vec::new();
    let mut note_spans: Vec<Span> = Vec::new();

    for (key, base) in pitch::layout_keys() {
        let shifted = base as i32 + offset;
        let playable = (pitch::INSTRUMENT_MIN as i32..=pitch::INSTRUMENT_MAX as i32)
            .contains(&shifted);
        let active = playable && view.highlights[shifted as usize];

        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if playable {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        key_spans.push(Span::styled(format!(" {key} "), style));
        note_spans.push(Span::styled(
            if playable {
                format!("{shifted:^3}")
            } else {
                " - ".to_string()
            },
            Style::default().fg(Color::DarkGray),
        ));
    }

    let title = format!(
        " Keys (playable {}..{}) ",
        view.range.min, view.range.max
    );
    let widget = Paragraph::new(vec![Line::from(key_spans), Line::from(note_spans)])
        .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(widget, area);
}
