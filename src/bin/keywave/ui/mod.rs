//! Terminal UI: status bar, keyboard strip, waveform and spectrum charts.

mod keyboard;
mod spectrum;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use keywave::analysis::AnalysisFrame;
use keywave::dsp::Waveform;
use keywave::pitch::NoteRange;
use keywave::synth::SynthParams;

use super::app::SelectedParam;

/// Everything the UI needs for one frame, snapshotted under a single
/// short-lived lock of the synth.
pub struct ViewState {
    pub frame: AnalysisFrame,
    pub params: SynthParams,
    pub range: NoteRange,
    pub selected: SelectedParam,
    pub highlights: [bool; 128],
}

pub fn draw(frame: &mut Frame, view: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Min(8),
        ])
        .split(frame.area());

    render_status(frame, chunks[0], view);
    keyboard::render_keyboard(frame, chunks[1], view);
    waveform::render_waveform(frame, chunks[2], &view.frame.time_domain);
    spectrum::render_spectrum(frame, chunks[3], &view.frame.frequency_db);
}

fn waveform_name(waveform: Waveform) -> &'static str {
    match waveform {
        Waveform::Sine => "sine",
        Waveform::Square => "square",
        Waveform::Sawtooth => "sawtooth",
        Waveform::Triangle => "triangle",
    }
}

fn render_status(frame: &mut Frame, area: ratatui::layout::Rect, view: &ViewState) {
    let params = &view.params;
    let env = params.envelope;

    let highlight = |selected: SelectedParam, label: String| -> Span<'static> {
        if view.selected == selected {
            Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Span::raw(label)
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", waveform_name(params.waveform)),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("| "),
        highlight(SelectedParam::Attack, format!("A {:.2}s ", env.attack)),
        highlight(SelectedParam::Decay, format!("D {:.2}s ", env.decay)),
        highlight(SelectedParam::Sustain, format!("S {:.2} ", env.sustain)),
        highlight(SelectedParam::Release, format!("R {:.2}s ", env.release)),
        Span::raw("| "),
        highlight(
            SelectedParam::LowpassCutoff,
            format!("lpf {:.0}Hz ", params.lowpass_hz),
        ),
        highlight(
            SelectedParam::HighpassCutoff,
            format!("hpf {:.0}Hz ", params.highpass_hz),
        ),
        Span::raw("| "),
        Span::raw(format!(
            "octave {:+} (notes {}..{})",
            params.octave_offset / 12,
            view.range.min,
            view.range.max
        )),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .title(" keywave  [1-4] waveform  [←/→] octave  [Tab/↑↓] adjust  [q] quit ")
            .borders(Borders::ALL),
    );
    frame.render_widget(widget, area);
}
