use keywave::pitch::NoteRange;
use keywave::synth::{EnvelopeUpdate, Synth, VoiceState};

const SAMPLE_RATE: f32 = 1_000.0;

fn fast_synth() -> Synth {
    let mut synth = Synth::new(SAMPLE_RATE);
    synth.set_envelope(EnvelopeUpdate {
        attack: Some(0.005),
        decay: Some(0.005),
        sustain: Some(0.6),
        release: Some(0.02),
    });
    synth
}

fn render(synth: &mut Synth, frames: usize) {
    let mut out = [0.0f32; 256];
    let mut remaining = frames;
    while remaining > 0 {
        let n = remaining.min(out.len());
        synth.render(&mut out[..n]);
        remaining -= n;
    }
}

#[test]
fn note_on_produces_sound_and_note_off_silences() {
    let mut synth = fast_synth();
    synth.note_on(60);

    let mut block = vec![0.0f32; 64];
    synth.render(&mut block);
    assert!(block.iter().any(|&s| s.abs() > 0.0));

    synth.note_off(60);
    render(&mut synth, 200);

    let mut tail = vec![0.0f32; 64];
    synth.render(&mut tail);
    assert!(
        tail.iter().all(|&s| s.abs() < 1e-3),
        "released voice should decay to silence"
    );
    assert_eq!(synth.registry().sounding_count(), 0);
}

#[test]
fn retrigger_settles_to_one_live_voice() {
    let mut synth = fast_synth();
    synth.note_on(60);
    render(&mut synth, 10);
    synth.note_on(60);

    assert_eq!(synth.registry().live_count(), 1);
    render(&mut synth, 50);
    assert_eq!(synth.registry().sounding_count(), 1);
}

#[test]
fn lifecycle_states_progress_in_order() {
    let mut synth = fast_synth();
    synth.note_on(60);
    assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Created));

    render(&mut synth, 20);
    assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Sustaining));

    synth.note_off(60);
    assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Releasing));

    render(&mut synth, 50);
    assert_eq!(synth.registry().voice_state(60), None);
}

#[test]
fn notes_outside_instrument_bounds_are_ignored() {
    let mut synth = fast_synth();
    synth.note_on(10); // below MIDI 36
    synth.note_on(120); // above MIDI 96
    assert_eq!(synth.registry().live_count(), 0);
}

#[test]
fn key_events_round_trip_through_the_pitch_mapper() {
    let mut synth = fast_synth();
    synth.key_down('a');
    assert!(synth.registry().is_live(60));

    synth.key_up('a');
    assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Releasing));

    // Unmapped keys are ignored without complaint.
    synth.key_down('z');
    assert_eq!(synth.registry().live_count(), 1);
}

#[test]
fn octave_shift_moves_key_resolution_but_not_held_notes() {
    let mut synth = fast_synth();
    synth.key_down('a');
    synth.shift_octave(12);
    synth.key_down('s');

    let notes: Vec<u8> = synth.registry().live_notes().collect();
    assert_eq!(notes, vec![60, 74]); // held C4 unchanged; S resolves up to D5
}

#[test]
fn key_up_releases_the_note_the_press_started() {
    let mut synth = fast_synth();
    synth.key_down('a'); // C4 at offset 0
    render(&mut synth, 20);

    // Shift octaves while the key is still physically down; the release
    // must still reach the voice from the press, not note 72.
    synth.set_octave_offset(12);
    synth.key_up('a');
    assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Releasing));

    render(&mut synth, 50);
    assert_eq!(
        synth.registry().sounding_count(),
        0,
        "no voice may be left sustaining after its key comes up"
    );
}

#[test]
fn mapped_range_reflects_offset_and_clamps() {
    let mut synth = fast_synth();
    assert_eq!(synth.mapped_note_range(), NoteRange { min: 60, max: 74 });

    synth.set_octave_offset(24);
    let range = synth.mapped_note_range();
    assert_eq!(range.max, 96);

    // Requests beyond the bound are clamped, not rejected.
    synth.set_octave_offset(36);
    assert_eq!(synth.params().octave_offset, 24);
}

#[test]
fn analysis_is_silent_before_any_note() {
    let synth = fast_synth();
    let frame = synth.sample_analysis();
    assert!(frame.time_domain.iter().all(|&s| s == 0.0));
}

#[test]
fn analysis_reflects_rendered_audio() {
    let mut synth = Synth::new(48_000.0);
    synth.note_on(69);
    render(&mut synth, 2048);

    let frame = synth.sample_analysis();
    assert!(frame.time_domain.iter().any(|&s| s.abs() > 0.01));

    // Spectral peak should be near 440 Hz (bin width 23.4 Hz).
    let peak_bin = frame
        .frequency_db
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    let peak_hz = peak_bin as f32 * 48_000.0 / 2048.0;
    assert!(
        (peak_hz - 440.0).abs() < 50.0,
        "expected peak near 440 Hz, got {peak_hz}"
    );
}

#[test]
fn waveform_change_applies_to_sounding_voices() {
    use keywave::dsp::Waveform;

    let mut synth = Synth::new(48_000.0);
    synth.set_envelope(EnvelopeUpdate {
        attack: Some(0.0),
        decay: Some(0.0),
        sustain: Some(1.0),
        release: Some(0.02),
    });
    synth.set_lowpass_cutoff(20_000.0);
    synth.note_on(45); // low note so the square's rails are in band

    render(&mut synth, 4096);
    synth.set_waveform(Waveform::Square);
    render(&mut synth, 4096);

    // A square wave spends nearly all its time near the rails; after the
    // retarget the tap should be seeing rail-heavy samples.
    let frame = synth.sample_analysis();
    let rail_share = frame
        .time_domain
        .iter()
        .filter(|s| s.abs() > 0.5)
        .count() as f32
        / frame.time_domain.len() as f32;
    assert!(
        rail_share > 0.5,
        "live retarget should change the sounding waveform, rail share {rail_share}"
    );
}

#[cfg(feature = "rtrb")]
mod messages {
    use super::*;
    use keywave::dsp::Waveform;
    use keywave::synth::ControlMessage;
    use rtrb::RingBuffer;

    #[test]
    fn control_messages_apply_in_arrival_order() {
        let (mut tx, mut rx) = RingBuffer::<ControlMessage>::new(16);
        let mut synth = fast_synth();

        tx.push(ControlMessage::NoteOn { note: 60 }).unwrap();
        tx.push(ControlMessage::SetWaveform(Waveform::Sawtooth))
            .unwrap();
        tx.push(ControlMessage::NoteOff { note: 60 }).unwrap();
        tx.push(ControlMessage::NoteOn { note: 64 }).unwrap();

        synth.apply_messages(&mut rx);

        assert_eq!(synth.registry().voice_state(60), Some(VoiceState::Releasing));
        assert_eq!(synth.registry().voice_state(64), Some(VoiceState::Created));
        assert_eq!(synth.params().waveform, Waveform::Sawtooth);
    }

    #[test]
    fn all_notes_off_message_releases_everything() {
        let (mut tx, mut rx) = RingBuffer::<ControlMessage>::new(16);
        let mut synth = fast_synth();
        synth.note_on(60);
        synth.note_on(64);

        tx.push(ControlMessage::AllNotesOff).unwrap();
        synth.apply_messages(&mut rx);

        let mut out = vec![0.0f32; 50];
        synth.render(&mut out);
        assert_eq!(synth.registry().live_count(), 0);
    }
}
