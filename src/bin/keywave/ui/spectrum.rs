//! Spectrum analyzer widget
//!
//! The analysis tap already provides linear-spaced magnitude bins; this
//! widget reduces them to log-spaced display points so the musically
//! interesting low end is not crushed into the left edge.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Number of display points across the chart.
const DISPLAY_BINS: usize = 48;

/// Reduce full-resolution FFT bins to log-spaced display points, taking the
/// peak magnitude within each span so narrow tones stay visible.
fn log_reduce(frequency_db: &[f64]) -> Vec<(f64, f64)> {
    if frequency_db.len() < 2 {
        return Vec::new();
    }
    let bins = frequency_db.len();
    // Skip bin 0 (DC); log spacing needs a nonzero start.
    let min_bin = 1.0f64;
    let max_bin = bins as f64;
    let ratio = max_bin / min_bin;

    (0..DISPLAY_BINS)
        .map(|i| {
            let t0 = i as f64 / DISPLAY_BINS as f64;
            let t1 = (i + 1) as f64 / DISPLAY_BINS as f64;
            let lo = (min_bin * ratio.powf(t0)) as usize;
            let hi = ((min_bin * ratio.powf(t1)) as usize).clamp(lo + 1, bins);

            let peak = frequency_db[lo..hi]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            (i as f64, peak)
        })
        .collect()
}

/// Render the spectrum analyzer from a frequency-domain snapshot.
pub fn render_spectrum(frame: &mut Frame, area: Rect, frequency_db: &[f64]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let points = log_reduce(frequency_db);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let max_db = points
        .iter()
        .map(|(_, db)| *db)
        .fold(-100.0f64, f64::max);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, DISPLAY_BINS as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-100.0, max_db.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
