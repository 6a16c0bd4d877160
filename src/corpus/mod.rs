// Corpus data model: filename -> track index -> extracted track

pub mod extractor;
pub mod midi_parser;

pub use extractor::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::storage;

/// A single note-on event as it appeared in its track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    /// Raw ticks since the previous event in the same track
    pub delta: u32,
}

impl NoteEvent {
    pub fn new(channel: u8, pitch: u8, velocity: u8, delta: u32) -> Self {
        Self { channel, pitch, velocity, delta }
    }
}

// Notes are stored as [channel, pitch, velocity, delta] arrays in the dump.
impl Serialize for NoteEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.channel, self.pitch, self.velocity, self.delta).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NoteEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (channel, pitch, velocity, delta) = <(u8, u8, u8, u32)>::deserialize(deserializer)?;
        Ok(Self { channel, pitch, velocity, delta })
    }
}

/// One track of a MIDI file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track index within its file
    pub name: usize,
    /// Rounded beats per minute from the last tempo event, if any
    pub tempo: Option<u32>,
    /// Program number from the last program change, if any
    pub program: Option<u8>,
    pub notes: Vec<NoteEvent>,
}

impl Track {
    pub fn new(index: usize) -> Self {
        Self {
            name: index,
            tempo: None,
            program: None,
            notes: Vec::new(),
        }
    }
}

/// All tracks of one file, keyed by contiguous track index.
pub type FileRecord = BTreeMap<usize, Track>;

/// Complete extractor output, keyed by filename.
///
/// Sorted by filename so that the dump is identical across runs regardless of
/// directory listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    pub files: BTreeMap<String, FileRecord>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileRecord)> {
        self.files.iter()
    }

    pub fn insert(&mut self, filename: String, record: FileRecord) {
        self.files.insert(filename, record);
    }

    /// Total number of note events across every file and track
    pub fn note_count(&self) -> usize {
        self.files
            .values()
            .flat_map(|record| record.values())
            .map(|track| track.notes.len())
            .sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        storage::write_json(path, self)
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        storage::read_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_corpus() -> Corpus {
        let mut track0 = Track::new(0);
        track0.tempo = Some(120);
        let mut track1 = Track::new(1);
        track1.program = Some(33);
        track1.notes = vec![NoteEvent::new(0, 60, 100, 0), NoteEvent::new(0, 62, 90, 5)];

        let mut record = FileRecord::new();
        record.insert(0, track0);
        record.insert(1, track1);

        let mut corpus = Corpus::default();
        corpus.insert("song.mid".to_string(), record);
        corpus
    }

    #[test]
    fn dump_uses_stringified_track_keys_and_note_arrays() {
        let json = serde_json::to_value(sample_corpus()).unwrap();
        let track1 = &json["song.mid"]["1"];

        assert_eq!(track1["name"], 1);
        assert_eq!(track1["tempo"], serde_json::Value::Null);
        assert_eq!(track1["program"], 33);
        assert_eq!(track1["notes"], serde_json::json!([[0, 60, 100, 0], [0, 62, 90, 5]]));
        assert_eq!(json["song.mid"]["0"]["tempo"], 120);
        assert_eq!(json["song.mid"]["0"]["program"], serde_json::Value::Null);
    }

    #[test]
    fn dump_reloads_into_the_same_corpus() {
        let corpus = sample_corpus();
        let text = serde_json::to_string(&corpus).unwrap();
        let reloaded: Corpus = serde_json::from_str(&text).unwrap();

        assert_eq!(reloaded, corpus);
        assert_eq!(reloaded.note_count(), 2);
    }

    #[test]
    fn track_indices_beyond_nine_stay_numerically_ordered() {
        let mut record = FileRecord::new();
        for i in 0..12 {
            record.insert(i, Track::new(i));
        }
        let names: Vec<usize> = record.values().map(|t| t.name).collect();
        assert_eq!(names, (0..12).collect::<Vec<_>>());
    }
}
