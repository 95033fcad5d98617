/// Sound sequence capture
///
/// The sound machine records button presses as `(sound, offset)` events
/// measured from the moment recording started. The event log is the single
/// source of truth for both offline rendering and wall-clock playback.

use std::time::Instant;

/// Engine sample rate, fixed for samples, rendering and playback
pub const SAMPLE_RATE: u32 = 44_100;

/// Hard ceiling on the rendered timeline. Events scheduled past this point
/// are dropped; the render reports how many so the UI can say so.
pub const MAX_RENDER_MS: u64 = 30_000;

/// Silence appended after the last event
const TAIL_MS: u64 = 2_000;

/// Minimum timeline length per recorded event
const MIN_PER_EVENT_MS: u64 = 1_000;

/// The five pad sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    Kick,
    Snare,
    HiHat,
    Clap,
    Piano,
}

impl SoundId {
    pub const ALL: [SoundId; 5] = [
        SoundId::Kick,
        SoundId::Snare,
        SoundId::HiHat,
        SoundId::Clap,
        SoundId::Piano,
    ];

    /// Display name for pads and the sequence readout
    pub fn name(self) -> &'static str {
        match self {
            SoundId::Kick => "Kick Drum",
            SoundId::Snare => "Snare",
            SoundId::HiHat => "Hi-Hat",
            SoundId::Clap => "Clap",
            SoundId::Piano => "Piano",
        }
    }

    /// Asset file stem (e.g. "kick" -> assets/audio/kick.wav)
    pub fn file_stem(self) -> &'static str {
        match self {
            SoundId::Kick => "kick",
            SoundId::Snare => "snare",
            SoundId::HiHat => "hihat",
            SoundId::Clap => "clap",
            SoundId::Piano => "piano",
        }
    }
}

/// One recorded button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEvent {
    pub sound: SoundId,
    /// Milliseconds since recording started
    pub offset_ms: u64,
}

/// An ordered log of recorded events
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    events: Vec<SequenceEvent>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sound: SoundId, offset_ms: u64) {
        self.events.push(SequenceEvent { sound, offset_ms });
    }

    pub fn events(&self) -> &[SequenceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the last event, or 0 for an empty sequence
    pub fn last_offset_ms(&self) -> u64 {
        self.events.last().map(|e| e.offset_ms).unwrap_or(0)
    }

    /// Length of the rendered timeline in milliseconds:
    /// max(last event + 2s tail, 1s per event), clamped to the 30s ceiling.
    /// An empty sequence renders nothing.
    pub fn render_length_ms(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }

        let tailed = self.last_offset_ms() + TAIL_MS;
        let per_event = self.len() as u64 * MIN_PER_EVENT_MS;
        tailed.max(per_event).min(MAX_RENDER_MS)
    }
}

/// Captures presses into a sequence while recording is active
#[derive(Debug, Default)]
pub struct Recorder {
    started: Option<Instant>,
    sequence: Sequence,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.started.is_some()
    }

    /// Begin a new recording, discarding any in-progress log
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.sequence = Sequence::new();
    }

    /// Log a press at its wall-clock offset.
    /// Returns the captured offset, or None when not recording.
    pub fn capture(&mut self, sound: SoundId) -> Option<u64> {
        let started = self.started?;
        let offset_ms = started.elapsed().as_millis() as u64;
        self.sequence.push(sound, offset_ms);
        Some(offset_ms)
    }

    /// Number of events captured so far
    pub fn captured(&self) -> usize {
        self.sequence.len()
    }

    /// Stop recording and take the captured sequence
    pub fn stop(&mut self) -> Sequence {
        self.started = None;
        std::mem::take(&mut self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_with_offsets(offsets: &[u64]) -> Sequence {
        let mut seq = Sequence::new();
        for &offset in offsets {
            seq.push(SoundId::Kick, offset);
        }
        seq
    }

    #[test]
    fn empty_sequence_renders_nothing() {
        assert_eq!(Sequence::new().render_length_ms(), 0);
    }

    #[test]
    fn timeline_gets_two_second_tail() {
        // [0, 500, 1200] -> 1200 + 2000 = 3200ms
        let seq = sequence_with_offsets(&[0, 500, 1200]);
        assert_eq!(seq.render_length_ms(), 3200);
    }

    #[test]
    fn timeline_reserves_one_second_per_event() {
        // Five rapid events: 5 * 1000 beats 120 + 2000
        let seq = sequence_with_offsets(&[0, 30, 60, 90, 120]);
        assert_eq!(seq.render_length_ms(), 5000);
    }

    #[test]
    fn timeline_clamps_to_ceiling() {
        let seq = sequence_with_offsets(&[0, 45_000]);
        assert_eq!(seq.render_length_ms(), MAX_RENDER_MS);
    }

    #[test]
    fn recorder_lifecycle() {
        let mut recorder = Recorder::new();
        assert!(!recorder.is_recording());
        assert!(recorder.capture(SoundId::Snare).is_none());

        recorder.start();
        assert!(recorder.is_recording());
        assert!(recorder.capture(SoundId::Snare).is_some());
        assert!(recorder.capture(SoundId::Kick).is_some());
        assert_eq!(recorder.captured(), 2);

        let seq = recorder.stop();
        assert!(!recorder.is_recording());
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.events()[0].sound, SoundId::Snare);
        assert_eq!(seq.events()[1].sound, SoundId::Kick);

        // Stopping drained the log
        assert_eq!(recorder.captured(), 0);
    }

    #[test]
    fn capture_offsets_are_monotonic() {
        let mut recorder = Recorder::new();
        recorder.start();
        let first = recorder.capture(SoundId::Clap).unwrap();
        let second = recorder.capture(SoundId::Clap).unwrap();
        assert!(second >= first);
    }
}
