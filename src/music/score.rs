//! Polyphonic event sequences and the temporal algebra over them.
//!
//! A [`MusicEvent`] is the set of notes sounding from one instant; a
//! [`Music`] value is a time-ordered sequence of such events. Sequences are
//! kept canonical — events sorted by strictly increasing start time, notes
//! per event deduplicated — so every operator can assume and preserve the
//! ordering invariants.

use std::collections::BTreeSet;

use super::note::NoteValue;
use super::time::Time;

/// All notes starting at one instant. `notes` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicEvent {
    pub start: Time,
    pub notes: BTreeSet<NoteValue>,
}

impl MusicEvent {
    /// An event holding a single note.
    pub fn single(start: Time, note: NoteValue) -> Self {
        let mut notes = BTreeSet::new();
        notes.insert(note);
        Self { start, notes }
    }

    /// End time of the longest note in this event.
    pub fn end(&self) -> Time {
        let longest = self
            .notes
            .iter()
            .map(|n| n.duration)
            .max()
            .unwrap_or(Time::ZERO);
        self.start + longest
    }
}

/// A time-ordered sequence of polyphonic events.
///
/// Canonical form: events sorted by start time, no two events sharing a
/// start (same-start events are merged by note-set union), no empty events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Music {
    events: Vec<MusicEvent>,
}

impl Music {
    /// The empty sequence — identity for concatenation and union.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single note (or rest) sounding at time zero.
    pub fn single(note: NoteValue) -> Self {
        Self {
            events: vec![MusicEvent::single(Time::ZERO, note)],
        }
    }

    /// Build a sequence from arbitrary events, restoring canonical form.
    pub fn from_events(events: impl IntoIterator<Item = MusicEvent>) -> Self {
        let mut events: Vec<MusicEvent> = events.into_iter().filter(|e| !e.notes.is_empty()).collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        let mut merged: Vec<MusicEvent> = Vec::with_capacity(events.len());
        for event in events {
            match merged.last_mut() {
                Some(last) if last.start == event.start => {
                    last.notes.extend(event.notes);
                }
                _ => merged.push(event),
            }
        }
        Self { events: merged }
    }

    pub fn events(&self) -> &[MusicEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Total extent: the latest end time reached by any note. Trailing rests
    /// count, so silences advance time under concatenation.
    pub fn span(&self) -> Time {
        self.events
            .iter()
            .map(MusicEvent::end)
            .max()
            .unwrap_or(Time::ZERO)
    }

    fn shifted(&self, delta: Time) -> Self {
        Self {
            events: self
                .events
                .iter()
                .map(|e| MusicEvent {
                    start: e.start + delta,
                    notes: e.notes.clone(),
                })
                .collect(),
        }
    }

    /// Temporal concatenation: `other` plays after this sequence has run its
    /// full span.
    pub fn concat(&self, other: &Self) -> Self {
        let shift = self.span();
        Self::from_events(
            self.events
                .iter()
                .cloned()
                .chain(other.shifted(shift).events),
        )
    }

    /// Simultaneous union: both sequences on one timeline, same-start events
    /// merged into chords.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_events(self.events.iter().cloned().chain(other.events.iter().cloned()))
    }

    /// Shift every pitched note by `semitones`; rests pass through. On a
    /// pitch leaving [0, 127], returns the offending MIDI value.
    pub fn transposed(&self, semitones: i64) -> Result<Self, i64> {
        let mut events = Vec::with_capacity(self.events.len());
        for event in &self.events {
            let mut notes = BTreeSet::new();
            for note in &event.notes {
                match note.pitch.transposed(semitones) {
                    Some(pitch) => {
                        notes.insert(NoteValue::new(pitch, note.duration));
                    }
                    None => return Err(note.pitch.midi() + semitones),
                }
            }
            events.push(MusicEvent {
                start: event.start,
                notes,
            });
        }
        Ok(Self { events })
    }

    /// The first event alone, at its original start time. `None` when empty.
    pub fn head(&self) -> Option<Self> {
        self.events.first().map(|e| Self {
            events: vec![e.clone()],
        })
    }

    /// Everything after the first event, start times unchanged. `None` when
    /// empty.
    pub fn tail(&self) -> Option<Self> {
        if self.events.is_empty() {
            return None;
        }
        Some(Self {
            events: self.events[1..].to_vec(),
        })
    }

    /// Lowest pitch in the first event (-1 when that note is a rest).
    /// `None` when empty.
    pub fn first_pitch(&self) -> Option<i64> {
        let first = self.events.first()?;
        first.notes.iter().next().map(|n| n.pitch.midi())
    }

    /// Translate the sequence so its earliest event starts at zero,
    /// preserving every inter-event offset. Empty stays empty.
    pub fn initialized(&self) -> Self {
        match self.events.first() {
            Some(first) => self.shifted_back(first.start),
            None => Self::empty(),
        }
    }

    fn shifted_back(&self, delta: Time) -> Self {
        Self {
            events: self
                .events
                .iter()
                .map(|e| MusicEvent {
                    start: e.start - delta,
                    notes: e.notes.clone(),
                })
                .collect(),
        }
    }
}
