//! The musical value model: exact time, notes, event sequences, and the
//! JSON export boundary.

pub mod export;
pub mod note;
pub mod score;
pub mod time;

pub use note::{Accidental, NotePitch, NoteValue};
pub use score::{Music, MusicEvent};
pub use time::Time;
