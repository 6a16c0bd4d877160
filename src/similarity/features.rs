// Per-file note histogram used as the embedding input row

use crate::corpus::FileRecord;

/// Number of histogram buckets; wider than the MIDI pitch range so any byte fits.
pub const HISTOGRAM_BINS: usize = 256;

/// Timing-weighted note usage of one file, one bucket per pitch value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHistogram {
    weights: [u64; HISTOGRAM_BINS],
}

impl Default for NoteHistogram {
    fn default() -> Self {
        Self { weights: [0; HISTOGRAM_BINS] }
    }
}

impl NoteHistogram {
    /// Accumulate every track of `record` into one histogram.
    ///
    /// Notes are taken in consecutive pairs (0,1), (2,3), ...: the second
    /// note's delta is added to the first note's pitch bucket. A trailing
    /// unpaired note contributes nothing. This matches the existing output
    /// format even though it looks like a note-on/note-off pairing slip.
    pub fn from_file(record: &FileRecord) -> Self {
        let mut histogram = Self::default();

        for track in record.values() {
            for pair in track.notes.chunks_exact(2) {
                histogram.weights[pair[0].pitch as usize] += pair[1].delta as u64;
            }
        }

        histogram
    }

    pub fn weight(&self, pitch: usize) -> u64 {
        self.weights[pitch]
    }

    pub fn total(&self) -> u64 {
        self.weights.iter().sum()
    }

    /// Row form consumed by the reduction step
    pub fn to_vector(&self) -> Vec<f64> {
        self.weights.iter().map(|&w| w as f64).collect()
    }
}
