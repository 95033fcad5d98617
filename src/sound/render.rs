/// Offline sequence rendering
///
/// Mixes a recorded sequence into a single fixed-rate interleaved-stereo
/// buffer. Every event's sample is added to the timeline at its recorded
/// offset; a sound missing from the bank skips its events only, and events
/// whose start lies past the timeline ceiling are dropped and counted so the
/// UI can report the truncation instead of hiding it.

use super::bank::SampleBank;
use super::sequence::{Sequence, SAMPLE_RATE};

/// Result of an offline render
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// Interleaved stereo f32 timeline
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Events that fell past the timeline ceiling
    pub dropped_events: usize,
    /// Events whose sound had no sample in the bank
    pub skipped_missing: usize,
}

impl RenderOutcome {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Render a sequence against a sample bank.
/// An empty sequence yields an empty buffer; callers are expected to have
/// short-circuited that case already ("nothing recorded").
pub fn render_sequence(sequence: &Sequence, bank: &SampleBank) -> RenderOutcome {
    let total_ms = sequence.render_length_ms();
    let frames = (total_ms * SAMPLE_RATE as u64 / 1000) as usize;
    let mut mix = vec![0.0f32; frames * 2];

    let mut dropped_events = 0;
    let mut skipped_missing = 0;

    for event in sequence.events() {
        let start_frame = (event.offset_ms * SAMPLE_RATE as u64 / 1000) as usize;
        if start_frame >= frames {
            dropped_events += 1;
            continue;
        }

        let sample = match bank.get(event.sound) {
            Some(sample) => sample,
            None => {
                skipped_missing += 1;
                continue;
            }
        };

        // Additive mix, truncated at the end of the timeline
        let base = start_frame * 2;
        let available = mix.len() - base;
        for (i, value) in sample.data().iter().take(available).enumerate() {
            mix[base + i] += value;
        }
    }

    RenderOutcome {
        samples: mix,
        sample_rate: SAMPLE_RATE,
        dropped_events,
        skipped_missing,
    }
}

/// Convert a float timeline to interleaved 16-bit PCM.
/// Negative values scale by 32768 and positive by 32767, clamped, matching
/// the usual symmetric-range treatment of 16-bit audio.
pub fn to_interleaved_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            if s < 0.0 {
                (s * 32768.0).max(-32768.0) as i16
            } else {
                (s * 32767.0).min(32767.0) as i16
            }
        })
        .collect()
}
