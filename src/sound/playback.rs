/// Audio output and sequence playback
///
/// `AudioOutput` is the widget's owned handle to the audio device: created
/// on first use, dropped on teardown. Pad presses play as independent
/// one-shot sources so overlapping presses never cut each other off.
///
/// `Player` replays a recorded sequence against wall-clock timers on a
/// dedicated thread. Cancellation is an atomic flag checked before every
/// trigger, so once `stop` returns no further sound can fire; a generation
/// counter lets the UI ignore completion messages from a superseded run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Source};

use super::bank::Sample;
use super::sequence::SAMPLE_RATE;

/// Owned audio device handle
pub struct AudioOutput {
    // Keeps the device stream alive; dropping it closes the device
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self, String> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("No audio output device: {}", e))?;
        Ok(AudioOutput {
            _stream: stream,
            handle,
        })
    }

    /// Fire-and-forget playback of a pad sample at the given volume [0, 1].
    /// Each call creates an independent source, so presses overlap freely.
    pub fn play_sample(&self, sample: &Sample, volume: f32) {
        let source =
            SamplesBuffer::new(2, SAMPLE_RATE, sample.data().to_vec()).amplify(volume);
        if let Err(err) = self.handle.play_raw(source) {
            eprintln!("⚠️  Error playing sound: {}", err);
        }
    }

    /// Handle for playback threads
    pub fn handle(&self) -> OutputStreamHandle {
        self.handle.clone()
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput").finish()
    }
}

/// A sound scheduled for sequence playback
#[derive(Debug, Clone)]
pub struct ScheduledSound {
    pub frames: Arc<Vec<f32>>,
    pub offset_ms: u64,
}

/// Sequence playback with atomic cancel-all
#[derive(Debug, Default)]
pub struct Player {
    cancel: Option<Arc<AtomicBool>>,
    generation: u64,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently started run
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start replaying the scheduled sounds against wall-clock time.
    /// Any previous run is cancelled first. Returns the new generation for
    /// matching up the completion message.
    pub fn start(
        &mut self,
        sounds: Vec<ScheduledSound>,
        output: OutputStreamHandle,
        volume: f32,
    ) -> u64 {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));
        self.generation += 1;

        thread::spawn(move || {
            let offsets: Vec<u64> = sounds.iter().map(|s| s.offset_ms).collect();
            run_schedule(&offsets, &cancel, |index| {
                let frames = sounds[index].frames.as_ref().clone();
                let source = SamplesBuffer::new(2, SAMPLE_RATE, frames).amplify(volume);
                if let Err(err) = output.play_raw(source) {
                    eprintln!("⚠️  Error playing sound: {}", err);
                }
            });
        });

        self.generation
    }

    /// Cancel all pending triggers. Nothing fires after this returns.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Milliseconds from playback start until the last scheduled sound has
/// finished sounding, accounting for each sample's own duration
pub fn schedule_end_ms(sounds: &[ScheduledSound]) -> u64 {
    sounds
        .iter()
        .map(|s| {
            let duration_ms = (s.frames.len() as u64 / 2) * 1000 / SAMPLE_RATE as u64;
            s.offset_ms + duration_ms
        })
        .max()
        .unwrap_or(0)
}

/// Walk the offsets in order, sleeping until each one is due and firing its
/// callback. The cancel flag is checked before every fire and at least every
/// 10ms while waiting.
fn run_schedule<F: FnMut(usize)>(offsets: &[u64], cancelled: &AtomicBool, mut fire: F) {
    let start = Instant::now();

    for (index, &offset_ms) in offsets.iter().enumerate() {
        let target = Duration::from_millis(offset_ms);
        loop {
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            let elapsed = start.elapsed();
            if elapsed >= target {
                break;
            }
            thread::sleep((target - elapsed).min(Duration::from_millis(10)));
        }

        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        fire(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn cancel_flag_blocks_pending_triggers() {
        // A pre-cancelled schedule fires nothing, even for due events
        let cancelled = AtomicBool::new(true);
        let mut fired = Vec::new();
        run_schedule(&[0, 5], &cancelled, |i| fired.push(i));
        assert!(fired.is_empty());
    }

    #[test]
    fn due_events_fire_in_order() {
        let cancelled = AtomicBool::new(false);
        let mut fired = Vec::new();
        run_schedule(&[0, 0, 1], &cancelled, |i| fired.push(i));
        assert_eq!(fired, vec![0, 1, 2]);
    }

    #[test]
    fn mid_run_cancel_stops_later_events() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let fired = Arc::new(Mutex::new(Vec::new()));

        let flag = Arc::clone(&cancelled);
        let sink = Arc::clone(&fired);
        let worker = thread::spawn(move || {
            // Second event is far enough out that the cancel always wins
            run_schedule(&[0, 60_000], &flag, |i| sink.lock().unwrap().push(i));
        });

        thread::sleep(Duration::from_millis(100));
        cancelled.store(true, Ordering::SeqCst);
        worker.join().unwrap();

        assert_eq!(*fired.lock().unwrap(), vec![0]);
    }

    #[test]
    fn schedule_end_covers_sample_tails() {
        // One second of stereo at the engine rate
        let second = Arc::new(vec![0.0f32; SAMPLE_RATE as usize * 2]);
        let blip = Arc::new(vec![0.0f32; 441 * 2]); // 10ms

        let sounds = vec![
            ScheduledSound {
                frames: Arc::clone(&second),
                offset_ms: 1_000,
            },
            // Starts later but ends well before the long sample does
            ScheduledSound {
                frames: blip,
                offset_ms: 1_500,
            },
        ];

        assert_eq!(schedule_end_ms(&sounds), 2_000);
        assert_eq!(schedule_end_ms(&[]), 0);
    }

    #[test]
    fn player_stop_is_idempotent() {
        let mut player = Player::new();
        player.stop();
        player.stop();
        assert_eq!(player.generation(), 0);
    }
}
