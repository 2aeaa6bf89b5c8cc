/*
Pitch mapping
=============

Everything that turns an input identifier into a MIDI note number:

  * a physical keyboard key (home row naturals, top row sharps), shifted by
    the process-wide octave offset and checked against the instrument range
  * a piano-roll position given as (note name, display octave)

plus the note-number -> frequency conversion. All functions here are pure:
the only inputs are the arguments themselves, so the same key with the same
octave offset always resolves to the same note.

MIDI conventions: A4 = 69 = 440 Hz; note = semitone + (octave + 1) * 12
with C = 0 .. B = 11. The instrument models a 61-key range, MIDI 36..=96.

Keyboard layout (spans C4..D5, base notes 60..=74):

      W   E       T   Y   U       O
    A   S   D   F   G   H   J   K   L
    C4  D4  E4  F4  G4  A4  B4  C5  D5
*/

/// Lowest playable note (C2 on a 61-key instrument).
pub const INSTRUMENT_MIN: u8 = 36;
/// Highest playable note (C7 on a 61-key instrument).
pub const INSTRUMENT_MAX: u8 = 96;

/// Octave offset bounds in semitones (two octaves either way).
pub const MAX_OCTAVE_OFFSET: i32 = 24;

/// Physical key to base note number, before the octave offset is applied.
const KEY_TABLE: &[(char, u8)] = &[
    // Home row: naturals C4..D5
    ('A', 60),
    ('S', 62),
    ('D', 64),
    ('F', 65),
    ('G', 67),
    ('H', 69),
    ('J', 71),
    ('K', 72),
    ('L', 74),
    // Top row: the sharps in between
    ('W', 61),
    ('E', 63),
    ('T', 66),
    ('Y', 68),
    ('U', 70),
    ('O', 73),
];

const KEY_BASE_MIN: u8 = 60;
const KEY_BASE_MAX: u8 = 74;

/// The span of note numbers currently reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRange {
    pub min: u8,
    pub max: u8,
}

/// Equal-temperament frequency for a MIDI note number. A4 = 69 = 440 Hz.
#[inline]
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Snap an octave offset request to a whole octave within bounds.
pub fn clamp_octave_offset(semitones: i32) -> i32 {
    let whole_octaves = (semitones as f32 / 12.0).round() as i32;
    (whole_octaves * 12).clamp(-MAX_OCTAVE_OFFSET, MAX_OCTAVE_OFFSET)
}

/// Resolve a physical key to a note number under the given octave offset.
///
/// Returns `None` for unmapped keys and for results outside the instrument
/// range; by policy both are silently ignored upstream.
pub fn resolve_key(key: char, octave_offset: i32) -> Option<u8> {
    let upper = key.to_ascii_uppercase();
    let base = KEY_TABLE
        .iter()
        .find(|(k, _)| *k == upper)
        .map(|(_, note)| *note)?;

    let shifted = base as i32 + octave_offset;
    if (INSTRUMENT_MIN as i32..=INSTRUMENT_MAX as i32).contains(&shifted) {
        Some(shifted as u8)
    } else {
        None
    }
}

/// Resolve a piano-roll position: note name (with enharmonic aliases) plus
/// display octave. `("C", 4)` is middle C, note 60.
pub fn resolve_position(name: &str, octave: i32) -> Option<u8> {
    let semitone = note_name_offset(name)?;
    let note = semitone + (octave + 1) * 12;
    u8::try_from(note).ok().filter(|n| *n <= 127)
}

/// Semitone offset within the octave: C = 0 .. B = 11. Sharps and flats of
/// the same pitch map identically.
fn note_name_offset(name: &str) -> Option<i32> {
    let offset = match name {
        "C" => 0,
        "C#" | "Db" => 1,
        "D" => 2,
        "D#" | "Eb" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "Gb" => 6,
        "G" => 7,
        "G#" | "Ab" => 8,
        "A" => 9,
        "A#" | "Bb" => 10,
        "B" => 11,
        _ => return None,
    };
    Some(offset)
}

/// The keyboard-reachable note span under the given octave offset, clamped
/// to the instrument range. Drives the "playable range" cue in the UI.
pub fn mapped_note_range(octave_offset: i32) -> NoteRange {
    let clamp = |n: i32| n.clamp(INSTRUMENT_MIN as i32, INSTRUMENT_MAX as i32) as u8;
    NoteRange {
        min: clamp(KEY_BASE_MIN as i32 + octave_offset),
        max: clamp(KEY_BASE_MAX as i32 + octave_offset),
    }
}

/// All physical keys in the layout, low note to high. Used by the UI to
/// draw the keyboard strip.
pub fn layout_keys() -> impl Iterator<Item = (char, u8)> {
    let mut keys: Vec<(char, u8)> = KEY_TABLE.to_vec();
    keys.sort_by_key(|(_, note)| *note);
    keys.into_iter()
}
