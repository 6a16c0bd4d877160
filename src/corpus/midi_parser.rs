// MIDI file decoding into tagged per-track events

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

/// The event kinds the extractor cares about, decoded once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Set-tempo meta event, microseconds per quarter note
    TempoChange(u32),
    ProgramChange { channel: u8, program: u8 },
    NoteOn { channel: u8, key: u8, velocity: u8 },
    TrackName(String),
    Other,
}

/// An event together with its raw delta time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    /// Ticks since the previous event in the same track
    pub delta: u32,
    pub kind: EventKind,
}

/// Parse a standard MIDI file into its tracks, preserving event order.
pub fn parse_tracks(data: &[u8]) -> Result<Vec<Vec<TrackEvent>>, midly::Error> {
    let smf = Smf::parse(data)?;

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|event| TrackEvent {
                    delta: event.delta.as_int(),
                    kind: decode_kind(&event.kind),
                })
                .collect()
        })
        .collect();

    Ok(tracks)
}

fn decode_kind(kind: &TrackEventKind) -> EventKind {
    match kind {
        TrackEventKind::Meta(MetaMessage::Tempo(t)) => EventKind::TempoChange(t.as_int()),
        TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
            EventKind::TrackName(String::from_utf8_lossy(name).into_owned())
        }
        TrackEventKind::Midi { channel, message } => match message {
            MidiMessage::ProgramChange { program } => EventKind::ProgramChange {
                channel: channel.as_int(),
                program: program.as_int(),
            },
            // Velocity 0 is kept as a note-on; it is not folded into note-off
            MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                channel: channel.as_int(),
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            _ => EventKind::Other,
        },
        _ => EventKind::Other,
    }
}

/// Convert microseconds per beat to beats per minute, rounded half-to-even.
///
/// Returns `None` for a zero tempo, which has no BPM equivalent.
pub fn tempo_to_bpm(us_per_beat: u32) -> Option<u32> {
    if us_per_beat == 0 {
        return None;
    }
    let bpm = 60_000_000.0 / us_per_beat as f64;
    Some(bpm.round_ties_even() as u32)
}
