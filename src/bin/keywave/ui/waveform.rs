//! Waveform oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// How many of the most recent tap samples to draw. The full analysis
/// window is wider than any terminal; the tail is the freshest signal.
const SCOPE_SAMPLES: usize = 512;

/// Render the waveform oscilloscope from a time-domain snapshot.
pub fn render_waveform(frame: &mut Frame, area: Rect, time_domain: &[f32]) {
    let tail = &time_domain[time_domain.len().saturating_sub(SCOPE_SAMPLES)..];

    let mut peak = 0.0f32;
    let mut data = Vec::with_capacity(tail.len());
    for (i, &sample) in tail.iter().enumerate() {
        peak = peak.max(sample.abs());
        data.push((i as f64, sample as f64));
    }

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let title = format!(" Waveform (peak {peak:.2}) ");
    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, tail.len() as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .labels(vec!["-1", "0", "+1"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
