//! Keywave - application wiring and event loop

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use rtrb::{Consumer, Producer, RingBuffer};

use keywave::dsp::Waveform;
use keywave::synth::{ControlMessage, EnvelopeUpdate, Synth, SynthParams};
use keywave::MAX_BLOCK_SIZE;

use super::ui;

const CONTROL_QUEUE_SIZE: usize = 256;
const ACTIVITY_QUEUE_SIZE: usize = 256;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Fallback note hold when the terminal cannot report key releases.
const DEGRADED_HOLD: Duration = Duration::from_millis(400);

/// Which envelope/filter parameter the Up/Down keys currently adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedParam {
    Attack,
    Decay,
    Sustain,
    Release,
    LowpassCutoff,
    HighpassCutoff,
}

impl SelectedParam {
    fn next(self) -> Self {
        use SelectedParam::*;
        match self {
            Attack => Decay,
            Decay => Sustain,
            Sustain => Release,
            Release => LowpassCutoff,
            LowpassCutoff => HighpassCutoff,
            HighpassCutoff => Attack,
        }
    }
}

/// Main application: owns the terminal loop and the audio stream.
pub struct Keywave {
    selected: SelectedParam,
    /// Keys currently held, with press timestamps for the degraded mode.
    held: HashMap<char, Instant>,
    /// Per-note highlight driven by the synth's activity events.
    highlights: [bool; 128],
    /// Last parameter snapshot, refreshed each frame; Up/Down adjustments
    /// are computed against this without holding the synth lock.
    params: SynthParams,
    key_release_supported: bool,
}

impl Keywave {
    pub fn new() -> Self {
        Self {
            selected: SelectedParam::Attack,
            held: HashMap::new(),
            highlights: [false; 128],
            params: SynthParams::default(),
            key_release_supported: false,
        }
    }

    /// Run the application (takes over the terminal, plays audio).
    pub fn run(mut self) -> EyreResult<()> {
        // Audio device setup, same shape as any cpal output stream.
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_QUEUE_SIZE);
        let (activity_tx, activity_rx) = RingBuffer::<(u8, bool)>::new(ACTIVITY_QUEUE_SIZE);

        let mut synth = Synth::new(sample_rate);
        synth.set_activity_listener(Box::new(ActivitySink { tx: activity_tx }));
        let synth = Arc::new(Mutex::new(synth));

        let stream = build_stream(&device, &config, channels, synth.clone(), control_rx)?;
        stream.play().wrap_err("failed to start audio stream")?;

        // Terminal setup.
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen)?;

        self.key_release_supported = supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release_supported {
            crossterm::execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, control_tx, activity_rx, synth);

        // Terminal teardown, even if the loop errored.
        if self.key_release_supported {
            let _ = crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = crossterm::execute!(std::io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();

        if !self.key_release_supported {
            eprintln!("note: terminal does not report key releases; notes auto-release");
        }

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
        mut control_tx: Producer<ControlMessage>,
        mut activity_rx: Consumer<(u8, bool)>,
        synth: Arc<Mutex<Synth>>,
    ) -> EyreResult<()> {
        let mut last_frame = Instant::now();

        loop {
            let timeout = FRAME_INTERVAL
                .checked_sub(last_frame.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key, &mut control_tx) {
                        let _ = control_tx.push(ControlMessage::AllNotesOff);
                        return Ok(());
                    }
                }
            }

            if last_frame.elapsed() >= FRAME_INTERVAL {
                last_frame = Instant::now();

                self.auto_release_held(&mut control_tx);

                while let Ok((note, active)) = activity_rx.pop() {
                    self.highlights[note as usize] = active;
                }

                let view = {
                    let synth = synth.lock().unwrap();
                    ui::ViewState {
                        frame: synth.sample_analysis(),
                        params: *synth.params(),
                        range: synth.mapped_note_range(),
                        selected: self.selected,
                        highlights: self.highlights,
                    }
                };
                self.params = view.params;
                terminal.draw(|f| ui::draw(f, &view))?;
            }
        }
    }

    /// Handle one key event. Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent, tx: &mut Producer<ControlMessage>) -> bool {
        if key.kind == KeyEventKind::Repeat {
            return false; // repeat suppression: a held key is one note
        }

        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                let c = c.to_ascii_lowercase();
                if self.held.remove(&c).is_some() {
                    let _ = tx.push(ControlMessage::KeyUp { key: c });
                }
            }
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('q') | KeyCode::Char('Q') => return true,

            KeyCode::Char(c @ '1'..='4') => {
                let waveform = match c {
                    '1' => Waveform::Sine,
                    '2' => Waveform::Square,
                    '3' => Waveform::Sawtooth,
                    _ => Waveform::Triangle,
                };
                let _ = tx.push(ControlMessage::SetWaveform(waveform));
            }

            KeyCode::Left => {
                let _ = tx.push(ControlMessage::ShiftOctave(-12));
            }
            KeyCode::Right => {
                let _ = tx.push(ControlMessage::ShiftOctave(12));
            }

            KeyCode::Tab => {
                self.selected = self.selected.next();
            }
            KeyCode::Up => {
                let _ = tx.push(self.adjust_message(1.0));
            }
            KeyCode::Down => {
                let _ = tx.push(self.adjust_message(-1.0));
            }

            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                if self.held.insert(c, Instant::now()).is_none() {
                    let _ = tx.push(ControlMessage::KeyDown { key: c });
                }
            }

            _ => {}
        }

        false
    }

    fn adjust_message(&self, direction: f32) -> ControlMessage {
        let env = self.params.envelope;
        match self.selected {
            SelectedParam::Attack => ControlMessage::SetEnvelope(EnvelopeUpdate::attack(
                (env.attack + direction * 0.01).max(0.0),
            )),
            SelectedParam::Decay => ControlMessage::SetEnvelope(EnvelopeUpdate::decay(
                (env.decay + direction * 0.01).max(0.0),
            )),
            SelectedParam::Sustain => {
                ControlMessage::SetEnvelope(EnvelopeUpdate::sustain(env.sustain + direction * 0.05))
            }
            SelectedParam::Release => ControlMessage::SetEnvelope(EnvelopeUpdate::release(
                (env.release + direction * 0.01).max(0.0),
            )),
            SelectedParam::LowpassCutoff => {
                let factor = if direction > 0.0 { 1.25 } else { 0.8 };
                ControlMessage::SetLowpassCutoff(self.params.lowpass_hz * factor)
            }
            SelectedParam::HighpassCutoff => {
                let factor = if direction > 0.0 { 1.25 } else { 0.8 };
                ControlMessage::SetHighpassCutoff(self.params.highpass_hz * factor)
            }
        }
    }

    /// Without key-release reporting, end notes after a fixed hold.
    fn auto_release_held(&mut self, tx: &mut Producer<ControlMessage>) {
        if self.key_release_supported {
            return;
        }
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, pressed)| pressed.elapsed() >= DEGRADED_HOLD)
            .map(|(c, _)| *c)
            .collect();
        for c in expired {
            self.held.remove(&c);
            let _ = tx.push(ControlMessage::KeyUp { key: c });
        }
    }
}

impl Default for Keywave {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards registry activity events into the UI's queue. Runs inside the
/// audio callback, so it must stay allocation-free.
struct ActivitySink {
    tx: Producer<(u8, bool)>,
}

impl keywave::synth::ActivityListener for ActivitySink {
    fn voice_activity(&mut self, note: u8, active: bool) {
        let _ = self.tx.push((note, active));
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    channels: usize,
    synth: Arc<Mutex<Synth>>,
    mut control_rx: Consumer<ControlMessage>,
) -> EyreResult<cpal::Stream> {
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device
        .build_output_stream(
            &config.clone().into(),
            move |data: &mut [f32], _| {
                let mut synth = synth.lock().unwrap();
                synth.apply_messages(&mut control_rx);

                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames_to_render];
                    synth.render(block);

                    // Fan mono out to all channels.
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| eprintln!("audio error: {err}"),
            None,
        )
        .wrap_err("failed to build output stream")?;

    Ok(stream)
}
