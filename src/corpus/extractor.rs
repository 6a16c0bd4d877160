// Directory walk and per-track note extraction

use std::path::Path;

use super::midi_parser::{self, EventKind, TrackEvent};
use super::{Corpus, FileRecord, NoteEvent, Track};
use crate::error::{MidimapError, Result};

const MIDI_SUFFIX: &str = "mid";

/// True when the last three characters of `name` are exactly "mid".
///
/// No extension separator is required, so "xmid" matches while "a.midi" and
/// "a.MID" do not.
pub fn is_midi_filename(name: &str) -> bool {
    name.ends_with(MIDI_SUFFIX)
}

/// List the matching filenames in `dir`, sorted.
pub fn list_midi_files(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MidimapError::file_access(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MidimapError::file_access(dir, e))?;
        let file_name = entry.file_name();
        match file_name.to_str() {
            Some(name) if is_midi_filename(name) => names.push(name.to_string()),
            Some(_) => {}
            None => log::warn!("Skipping non UTF-8 filename {:?}", file_name),
        }
    }

    names.sort();
    Ok(names)
}

/// Reduce one track's events to its tempo, program and note-on list.
pub fn extract_track(index: usize, events: &[TrackEvent]) -> Track {
    let mut track = Track::new(index);

    for event in events {
        match &event.kind {
            EventKind::TempoChange(us_per_beat) => match midi_parser::tempo_to_bpm(*us_per_beat) {
                Some(bpm) => track.tempo = Some(bpm),
                None => log::warn!("Ignoring zero tempo event in track {}", index),
            },
            EventKind::ProgramChange { program, .. } => track.program = Some(*program),
            EventKind::NoteOn { channel, key, velocity } => {
                track.notes.push(NoteEvent::new(*channel, *key, *velocity, event.delta));
            }
            EventKind::TrackName(_) | EventKind::Other => {}
        }
    }

    track
}

/// Read, parse and extract every track of a single file.
pub fn extract_file(path: &Path, verbose: bool) -> Result<FileRecord> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let data = std::fs::read(path).map_err(|e| MidimapError::file_access(path, e))?;
    let tracks = midi_parser::parse_tracks(&data).map_err(|e| MidimapError::Parse {
        file: file.clone(),
        message: e.to_string(),
    })?;

    let mut record = FileRecord::new();
    for (index, events) in tracks.iter().enumerate() {
        let track = extract_track(index, events);

        if verbose {
            let name = events.iter().find_map(|e| match &e.kind {
                EventKind::TrackName(name) => Some(name.as_str()),
                _ => None,
            });
            log::debug!(
                "{} track {}: {:?} tempo={:?} program={:?} notes={}",
                file,
                index,
                name.unwrap_or(""),
                track.tempo,
                track.program,
                track.notes.len()
            );
        }

        record.insert(index, track);
    }

    Ok(record)
}

/// Extract every matching file in `dir`. The first failure aborts the run.
pub fn extract_corpus(dir: &Path, verbose: bool) -> Result<Corpus> {
    let names = list_midi_files(dir)?;
    log::info!("Found {} MIDI files in {}", names.len(), dir.display());

    let mut corpus = Corpus::default();
    for name in names {
        let record = extract_file(&dir.join(&name), verbose)?;
        corpus.insert(name, record);
    }

    log::info!(
        "Extracted {} files, {} note events",
        corpus.len(),
        corpus.note_count()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::midi_parser::fixtures::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        std::fs::write(dir.join(name), bytes).unwrap();
    }

    #[test]
    fn suffix_filter_matches_last_three_characters_only() {
        assert!(is_midi_filename("a.mid"));
        assert!(is_midi_filename("xmid"));
        assert!(is_midi_filename("mid"));
        assert!(!is_midi_filename("a.midi"));
        assert!(!is_midi_filename("a.txt"));
        assert!(!is_midi_filename("a.MID"));
        assert!(!is_midi_filename("id"));
    }

    #[test]
    fn lists_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mid", "a.mid", "xmid", "a.midi", "a.txt"] {
            write(dir.path(), name, b"");
        }

        let names = list_midi_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.mid", "b.mid", "xmid"]);
    }

    #[test]
    fn missing_directory_is_a_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_midi_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, MidimapError::FileAccess { .. }));
    }

    #[test]
    fn track_without_tempo_or_program_leaves_them_absent() {
        let bytes = smf_bytes(vec![vec![note_on(0, 0, 60, 100)]]);
        let tracks = midi_parser::parse_tracks(&bytes).unwrap();
        let track = extract_track(0, &tracks[0]);

        assert_eq!(track.tempo, None);
        assert_eq!(track.program, None);
        assert_eq!(track.notes, vec![NoteEvent::new(0, 60, 100, 0)]);
    }

    #[test]
    fn later_tempo_and_program_events_win() {
        let bytes = smf_bytes(vec![vec![
            tempo(0, 500_000),
            program(0, 1, 10),
            note_on(4, 1, 64, 90),
            tempo(8, 1_000_000),
            program(0, 1, 42),
        ]]);
        let tracks = midi_parser::parse_tracks(&bytes).unwrap();
        let track = extract_track(3, &tracks[0]);

        assert_eq!(track.name, 3);
        assert_eq!(track.tempo, Some(60));
        assert_eq!(track.program, Some(42));
    }

    #[test]
    fn only_note_on_events_are_stored_with_their_own_delta() {
        let bytes = smf_bytes(vec![vec![
            note_on(0, 0, 60, 100),
            note_off(96, 0, 60),
            note_on(5, 9, 36, 0),
        ]]);
        let tracks = midi_parser::parse_tracks(&bytes).unwrap();
        let track = extract_track(0, &tracks[0]);

        assert_eq!(
            track.notes,
            vec![NoteEvent::new(0, 60, 100, 0), NoteEvent::new(9, 36, 0, 5)]
        );
    }

    #[test]
    fn zero_tempo_is_ignored() {
        let events = vec![
            TrackEvent { delta: 0, kind: EventKind::TempoChange(500_000) },
            TrackEvent { delta: 0, kind: EventKind::TempoChange(0) },
        ];
        assert_eq!(extract_track(0, &events).tempo, Some(120));
    }

    #[test]
    fn every_track_gets_a_contiguous_index() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = smf_bytes(vec![
            vec![tempo(0, 500_000)],
            vec![],
            vec![program(0, 0, 1), note_on(0, 0, 70, 80)],
        ]);
        write(dir.path(), "song.mid", &bytes);

        let record = extract_file(&dir.path().join("song.mid"), true).unwrap();
        assert_eq!(record.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(record[&1usize].notes.is_empty());
        assert_eq!(record[&2usize].program, Some(1));
    }

    #[test]
    fn unparseable_file_fails_the_run_and_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.mid", &smf_bytes(vec![vec![note_on(0, 0, 60, 1)]]));
        write(dir.path(), "broken.mid", b"garbage");

        let err = extract_corpus(dir.path(), false).unwrap_err();
        match err {
            MidimapError::Parse { file, .. } => assert_eq!(file, "broken.mid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.mid", &smf_bytes(vec![vec![note_on(3, 0, 50, 60)]]));
        write(dir.path(), "a.mid", &smf_bytes(vec![vec![tempo(0, 400_000)]]));

        let first = serde_json::to_string(&extract_corpus(dir.path(), false).unwrap()).unwrap();
        let second = serde_json::to_string(&extract_corpus(dir.path(), false).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("{\"a.mid\""));
    }
}
