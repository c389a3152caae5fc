//! The visualization boundary.
//!
//! Printing a music value hands its JSON export to a [`Renderer`]; what
//! happens on the other side (piano-roll HTML, sample playback) is external
//! to the language core.

use std::fs;
use std::path::PathBuf;

/// Receives the JSON export of every printed music value.
pub trait Renderer {
    fn render(&mut self, music_json: &str);
}

/// Discards everything. Used when only the returned result matters.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _music_json: &str) {}
}

/// Collects rendered documents in memory.
#[derive(Debug, Default)]
pub struct CollectingRenderer {
    pub documents: Vec<String>,
}

impl Renderer for CollectingRenderer {
    fn render(&mut self, music_json: &str) {
        self.documents.push(music_json.to_string());
    }
}

/// Writes each rendered document to one file path; a later print overwrites
/// an earlier one, so the file ends up holding the last printed result.
#[derive(Debug)]
pub struct FileRenderer {
    path: PathBuf,
}

impl FileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Renderer for FileRenderer {
    fn render(&mut self, music_json: &str) {
        if let Err(e) = fs::write(&self.path, music_json) {
            eprintln!(
                "warning: could not write piano-roll data to {}: {e}",
                self.path.display()
            );
        }
    }
}
