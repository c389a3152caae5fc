//! Pitch spelling and note values.
//!
//! Converts spelled pitches (`Cn4`, `Ab3`, `Fdd2`) to MIDI note numbers.
//! C4 = middle C = MIDI 60; a rest carries no pitch but still occupies time.

use super::time::Time;

/// Accidental applied to a spelled pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone shift relative to the natural pitch.
    pub fn shift(self) -> i32 {
        match self {
            Self::DoubleFlat => -2,
            Self::Flat => -1,
            Self::Natural => 0,
            Self::Sharp => 1,
            Self::DoubleSharp => 2,
        }
    }

    /// The source spelling: `bb`, `b`, `n`, `d`, `dd`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::DoubleFlat => "bb",
            Self::Flat => "b",
            Self::Natural => "n",
            Self::Sharp => "d",
            Self::DoubleSharp => "dd",
        }
    }
}

/// Convert a spelled pitch to a MIDI note number.
///
/// Formula: `(octave + 1) * 12 + pitch_class + accidental_shift`.
/// C-1 = 0, C4 = 60, A4 = 69. Returns `None` when the result leaves [0, 127].
pub fn midi_number(letter: char, accidental: Accidental, octave: u8) -> Option<u8> {
    let pitch_class = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let midi = (octave as i32 + 1) * 12 + pitch_class + accidental.shift();
    if (0..=127).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// The pitch of a note value: a MIDI number, or a rest.
///
/// Rests order before every pitched note, so they surface first when an
/// event's notes are listed by ascending pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NotePitch {
    Rest,
    Midi(u8),
}

impl NotePitch {
    /// The wire encoding: the MIDI number, or -1 for a rest.
    pub fn midi(self) -> i64 {
        match self {
            Self::Rest => -1,
            Self::Midi(n) => n as i64,
        }
    }

    /// Shift by `semitones`. Rests pass through unchanged; a pitched note
    /// that leaves [0, 127] returns `None`.
    pub fn transposed(self, semitones: i64) -> Option<Self> {
        match self {
            Self::Rest => Some(Self::Rest),
            Self::Midi(n) => {
                let shifted = n as i64 + semitones;
                if (0..=127).contains(&shifted) {
                    Some(Self::Midi(shifted as u8))
                } else {
                    None
                }
            }
        }
    }
}

/// A single computed note: pitch plus duration in beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteValue {
    pub pitch: NotePitch,
    pub duration: Time,
}

impl NoteValue {
    pub fn new(pitch: NotePitch, duration: Time) -> Self {
        Self { pitch, duration }
    }

    /// A rest of the given duration.
    pub fn rest(duration: Time) -> Self {
        Self {
            pitch: NotePitch::Rest,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c() {
        assert_eq!(midi_number('C', Accidental::Natural, 4), Some(60));
    }

    #[test]
    fn a4_concert() {
        assert_eq!(midi_number('A', Accidental::Natural, 4), Some(69));
    }

    #[test]
    fn sharps_and_flats() {
        assert_eq!(midi_number('C', Accidental::Sharp, 4), Some(61));
        assert_eq!(midi_number('E', Accidental::Flat, 2), Some(39));
        assert_eq!(midi_number('B', Accidental::Flat, 3), Some(58));
    }

    #[test]
    fn double_accidentals() {
        assert_eq!(midi_number('C', Accidental::DoubleSharp, 4), Some(62));
        assert_eq!(midi_number('D', Accidental::DoubleFlat, 4), Some(60));
    }

    #[test]
    fn all_naturals_octave_4() {
        let expected = [('C', 60), ('D', 62), ('E', 64), ('F', 65), ('G', 67), ('A', 69), ('B', 71)];
        for (letter, midi) in expected {
            assert_eq!(midi_number(letter, Accidental::Natural, 4), Some(midi));
        }
    }

    #[test]
    fn out_of_range_rejected() {
        // Cbb0 = 12 - 2 = 10 is fine; Cbb-1 would be negative but octaves
        // are single digits, so only the top can overflow: Gdd9 = 129.
        assert_eq!(midi_number('G', Accidental::DoubleSharp, 9), None);
        assert_eq!(midi_number('B', Accidental::Natural, 9), None);
        assert_eq!(midi_number('G', Accidental::Natural, 9), Some(127));
    }

    #[test]
    fn invalid_letter() {
        assert_eq!(midi_number('H', Accidental::Natural, 4), None);
    }

    #[test]
    fn rest_encodes_as_minus_one() {
        assert_eq!(NotePitch::Rest.midi(), -1);
        assert_eq!(NotePitch::Midi(60).midi(), 60);
    }

    #[test]
    fn rest_orders_before_pitches() {
        assert!(NotePitch::Rest < NotePitch::Midi(0));
        assert!(NotePitch::Midi(59) < NotePitch::Midi(60));
    }

    #[test]
    fn transpose_shifts_pitches() {
        assert_eq!(NotePitch::Midi(60).transposed(12), Some(NotePitch::Midi(72)));
        assert_eq!(NotePitch::Midi(60).transposed(-60), Some(NotePitch::Midi(0)));
    }

    #[test]
    fn transpose_ignores_rests() {
        assert_eq!(NotePitch::Rest.transposed(12), Some(NotePitch::Rest));
        assert_eq!(NotePitch::Rest.transposed(-200), Some(NotePitch::Rest));
    }

    #[test]
    fn transpose_out_of_range() {
        assert_eq!(NotePitch::Midi(120).transposed(12), None);
        assert_eq!(NotePitch::Midi(5).transposed(-6), None);
    }
}
