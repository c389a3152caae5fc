//! JSON export of an evaluated sequence — the sole artifact the
//! visualization side consumes.
//!
//! Schema: `{"events": [{"start": n, "notes": [{"midi": i, "dur": n}]}]}`,
//! events sorted by start, notes by ascending MIDI number, rests as -1.

use serde::Serialize;

use super::score::Music;
use super::time::Time;

/// The export document for one music result.
#[derive(Debug, Clone, Serialize)]
pub struct MusicDoc {
    pub events: Vec<EventDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDoc {
    pub start: Time,
    pub notes: Vec<NoteDoc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteDoc {
    pub midi: i64,
    pub dur: Time,
}

/// Flatten a [`Music`] value into its export document.
pub fn document(music: &Music) -> MusicDoc {
    MusicDoc {
        events: music
            .events()
            .iter()
            .map(|event| EventDoc {
                start: event.start,
                notes: event
                    .notes
                    .iter()
                    .map(|note| NoteDoc {
                        midi: note.pitch.midi(),
                        dur: note.duration,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Serialize a [`Music`] value to the export JSON.
pub fn to_json(music: &Music) -> serde_json::Result<String> {
    serde_json::to_string(&document(music))
}
