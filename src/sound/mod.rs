/// Sound machine screen
///
/// A five-pad step sequencer: pads always play immediately; while recording,
/// presses are also logged with their wall-clock offsets. Stopping a
/// recording renders the log offline to stereo PCM and encodes it (MP3 with
/// a WAV fallback) for export. The state machine is Idle -> Recording ->
/// Rendering -> Idle, and the render step is never re-entered: record and
/// playback actions are rejected while it runs.

pub mod bank;
pub mod encode;
pub mod playback;
pub mod render;
pub mod sequence;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use iced::widget::{button, column, container, row, slider, text};
use iced::{Alignment, Element, Length, Task};
use tokio::task;

use bank::SampleBank;
use encode::Encoded;
use playback::{AudioOutput, Player, ScheduledSound};
use render::render_sequence;
use sequence::{Recorder, Sequence, SoundId, SAMPLE_RATE};

/// How long error banners stay up
const ERROR_DISMISS: Duration = Duration::from_secs(5);

/// Grace period after the last sample rings out before playback reports
/// completion
const PLAYBACK_GRACE_MS: u64 = 100;

/// Where the pad sound files live; missing files fall back to synthesis
const ASSETS_DIR: &str = "assets/audio";

/// Widget lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Recording,
    Rendering,
}

/// Everything produced by one render pass
#[derive(Debug, Clone)]
pub struct RenderedRecording {
    pub artifact: Encoded,
    pub event_count: usize,
    pub dropped_events: usize,
    pub skipped_missing: usize,
    /// Set when the MP3 path failed and WAV was used instead
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    PadPressed(SoundId),
    VolumeChanged(u8),
    StartRecording,
    StopRecording,
    RenderFinished(Result<RenderedRecording, String>),
    PlaySequence,
    StopPlayback,
    PlaybackFinished(u64),
    Export,
    ExportFinished(Result<String, String>),
    DismissNotice(u64),
}

pub struct SoundMachine {
    bank: Arc<SampleBank>,
    /// Audio device, opened on first use and released on teardown
    output: Option<AudioOutput>,
    player: Player,
    recorder: Recorder,
    phase: Phase,
    /// The last completed recording
    sequence: Sequence,
    artifact: Option<Encoded>,
    volume: u8,
    is_playing: bool,
    feedback: String,
    error: Option<String>,
    notice_seq: u64,
}

impl Default for SoundMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundMachine {
    pub fn new() -> Self {
        SoundMachine {
            bank: Arc::new(SampleBank::load(Path::new(ASSETS_DIR))),
            output: None,
            player: Player::new(),
            recorder: Recorder::new(),
            phase: Phase::Idle,
            sequence: Sequence::new(),
            artifact: None,
            volume: 80,
            is_playing: false,
            feedback: String::new(),
            error: None,
            notice_seq: 0,
        }
    }

    /// Release every live resource: pending playback timers and the audio
    /// device. Called when the screen is left.
    pub fn teardown(&mut self) {
        self.player.stop();
        self.is_playing = false;
        self.output = None;
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PadPressed(sound) => {
                if self.phase == Phase::Rendering {
                    return Task::none();
                }

                self.play_pad(sound);

                if self.recorder.is_recording() {
                    self.recorder.capture(sound);
                    self.feedback = format!(
                        "Added {} to sequence ({} sounds)",
                        sound.name(),
                        self.recorder.captured()
                    );
                }
                Task::none()
            }

            Message::VolumeChanged(volume) => {
                self.volume = volume;
                Task::none()
            }

            Message::StartRecording => {
                if self.phase == Phase::Rendering {
                    return Task::none();
                }

                self.player.stop();
                self.is_playing = false;
                self.recorder.start();
                self.phase = Phase::Recording;
                self.sequence = Sequence::new();
                self.artifact = None;
                self.feedback =
                    "Recording started. Press sound pads to add to the sequence.".to_string();
                Task::none()
            }

            Message::StopRecording => {
                if self.phase != Phase::Recording {
                    return Task::none();
                }

                let recorded = self.recorder.stop();
                if recorded.is_empty() {
                    self.phase = Phase::Idle;
                    self.feedback = "No sounds were recorded.".to_string();
                    return Task::none();
                }

                self.phase = Phase::Rendering;
                self.sequence = recorded.clone();
                self.feedback = format!(
                    "Recording stopped. Processing {} sounds...",
                    recorded.len()
                );

                let bank = Arc::clone(&self.bank);
                Task::perform(render_recording(recorded, bank), Message::RenderFinished)
            }

            Message::RenderFinished(result) => {
                self.phase = Phase::Idle;
                match result {
                    Ok(rendered) => {
                        println!(
                            "🎵 Rendered {} events ({} bytes, {})",
                            rendered.event_count,
                            rendered.artifact.bytes.len(),
                            rendered.artifact.format.extension()
                        );

                        self.feedback = format!(
                            "Recording complete! {} sounds captured.",
                            rendered.event_count
                        );

                        let mut notices = Vec::new();
                        if rendered.fallback_reason.is_some() {
                            notices.push(self.show_error(
                                "MP3 encoding failed. Your recording will be saved as a WAV file instead.",
                            ));
                        }
                        if rendered.dropped_events > 0 {
                            notices.push(self.show_error(format!(
                                "{} sound(s) fell past the 30-second limit and were left out of the recording.",
                                rendered.dropped_events
                            )));
                        }

                        self.artifact = Some(rendered.artifact);
                        Task::batch(notices)
                    }
                    Err(err) => {
                        self.feedback = "Failed to create recording.".to_string();
                        self.show_error(err)
                    }
                }
            }

            Message::PlaySequence => {
                if self.is_playing || self.sequence.is_empty() || self.phase != Phase::Idle {
                    return Task::none();
                }
                if !self.ensure_output() {
                    return self.show_error("Could not open an audio output device.");
                }

                let sounds: Vec<ScheduledSound> = self
                    .sequence
                    .events()
                    .iter()
                    .filter_map(|event| {
                        self.bank.get(event.sound).map(|sample| ScheduledSound {
                            frames: sample.shared(),
                            offset_ms: event.offset_ms,
                        })
                    })
                    .collect();

                let handle = match &self.output {
                    Some(output) => output.handle(),
                    None => return Task::none(),
                };

                let wait = Duration::from_millis(
                    playback::schedule_end_ms(&sounds) + PLAYBACK_GRACE_MS,
                );

                let volume = self.volume as f32 / 100.0;
                let generation = self.player.start(sounds, handle, volume);
                self.is_playing = true;
                self.feedback = "Playing sequence...".to_string();
                Task::perform(tokio::time::sleep(wait), move |_| {
                    Message::PlaybackFinished(generation)
                })
            }

            Message::PlaybackFinished(generation) => {
                // Ignore completions from a superseded playback run
                if self.is_playing && generation == self.player.generation() {
                    self.is_playing = false;
                    self.feedback = "Playback complete.".to_string();
                }
                Task::none()
            }

            Message::StopPlayback => {
                self.player.stop();
                self.is_playing = false;
                self.feedback = "Playback stopped.".to_string();
                Task::none()
            }

            Message::Export => {
                let artifact = match &self.artifact {
                    Some(artifact) => artifact.clone(),
                    None => return self.show_error("Please record a sequence first."),
                };

                let default_name = format!(
                    "sound-sequence-{}.{}",
                    chrono::Local::now().format("%Y%m%d-%H%M%S"),
                    artifact.format.extension()
                );

                let picked = rfd::FileDialog::new()
                    .set_title("Save Recording")
                    .set_file_name(&default_name)
                    .save_file();

                match picked {
                    Some(path) => {
                        Task::perform(write_artifact(path, artifact.bytes), Message::ExportFinished)
                    }
                    None => Task::none(),
                }
            }

            Message::ExportFinished(result) => match result {
                Ok(path) => {
                    println!("💾 Saved recording to {}", path);
                    self.feedback = format!("Saved recording to {}", path);
                    Task::none()
                }
                Err(err) => self.show_error(err),
            },

            Message::DismissNotice(seq) => {
                if seq == self.notice_seq {
                    self.error = None;
                }
                Task::none()
            }
        }
    }

    /// Play a pad immediately as an independent one-shot source
    fn play_pad(&mut self, sound: SoundId) {
        if !self.ensure_output() {
            return;
        }
        let volume = self.volume as f32 / 100.0;
        if let (Some(output), Some(sample)) = (&self.output, self.bank.get(sound)) {
            output.play_sample(sample, volume);
        }
    }

    /// Open the audio device lazily on first use
    fn ensure_output(&mut self) -> bool {
        if self.output.is_some() {
            return true;
        }
        match AudioOutput::new() {
            Ok(output) => {
                self.output = Some(output);
                true
            }
            Err(err) => {
                eprintln!("⚠️  {}", err);
                false
            }
        }
    }

    /// Show a transient error banner that dismisses itself
    fn show_error(&mut self, message: impl Into<String>) -> Task<Message> {
        self.error = Some(message.into());
        self.notice_seq += 1;
        let seq = self.notice_seq;
        Task::perform(tokio::time::sleep(ERROR_DISMISS), move |_| {
            Message::DismissNotice(seq)
        })
    }

    pub fn view(&self) -> Element<Message> {
        let rendering = self.phase == Phase::Rendering;

        let mut content = column![text("Sound Machine").size(32)].spacing(16);

        if let Some(error) = &self.error {
            content = content.push(text(error).size(16));
        }

        let status = match self.phase {
            Phase::Recording => format!(
                "● Recording in progress... {} sounds recorded",
                self.recorder.captured()
            ),
            Phase::Rendering => "Processing audio...".to_string(),
            Phase::Idle => self.feedback.clone(),
        };
        if !status.is_empty() {
            content = content.push(text(status).size(16));
        }

        // Pad grid
        let mut pads = row![].spacing(12);
        for sound in SoundId::ALL {
            let press = if rendering {
                None
            } else {
                Some(Message::PadPressed(sound))
            };
            pads = pads.push(
                button(text(sound.name()).size(16))
                    .on_press_maybe(press)
                    .padding(24),
            );
        }
        content = content.push(pads);

        // Volume
        content = content.push(
            row![
                text("Volume").size(16),
                slider(0..=100u8, self.volume, Message::VolumeChanged),
                text(format!("{}%", self.volume)).size(14),
            ]
            .spacing(12)
            .align_y(Alignment::Center),
        );

        // Transport controls
        let mut controls = row![].spacing(12);
        if self.phase == Phase::Recording {
            controls = controls.push(button("Stop Recording").on_press(Message::StopRecording));
        } else {
            controls = controls.push(
                button("Start Recording")
                    .on_press_maybe((!rendering).then_some(Message::StartRecording)),
            );
        }
        if !self.sequence.is_empty() && self.phase != Phase::Recording {
            if self.is_playing {
                controls = controls.push(button("Stop Playback").on_press(Message::StopPlayback));
            } else {
                controls = controls.push(
                    button("Play Sequence")
                        .on_press_maybe((!rendering).then_some(Message::PlaySequence)),
                );
            }
            controls = controls.push(
                button("Download Recording").on_press_maybe(
                    (!rendering && self.artifact.is_some()).then_some(Message::Export),
                ),
            );
        }
        content = content.push(controls);

        // Sequence readout
        let readout: Vec<&str> = if self.recorder.is_recording() {
            Vec::new()
        } else {
            self.sequence
                .events()
                .iter()
                .map(|e| e.sound.name())
                .collect()
        };
        if !readout.is_empty() {
            content = content.push(text(format!("Sequence: {}", readout.join(" → "))).size(14));
        }

        if let Some(artifact) = &self.artifact {
            content = content.push(
                text(format!(
                    "Ready to download: {} ({} KB)",
                    artifact.format.extension().to_uppercase(),
                    artifact.bytes.len() / 1024
                ))
                .size(14),
            );
        }

        container(content.padding(24))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Render and encode a recording off the UI thread
async fn render_recording(
    sequence: Sequence,
    bank: Arc<SampleBank>,
) -> Result<RenderedRecording, String> {
    task::spawn_blocking(move || {
        let outcome = render_sequence(&sequence, &bank);
        let pcm = render::to_interleaved_i16(&outcome.samples);
        let (artifact, fallback) = encode::encode(&pcm, SAMPLE_RATE);

        RenderedRecording {
            artifact,
            event_count: sequence.len(),
            dropped_events: outcome.dropped_events,
            skipped_missing: outcome.skipped_missing,
            fallback_reason: fallback.map(|e| e.to_string()),
        }
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))
}

/// Write the encoded artifact to disk
async fn write_artifact(path: PathBuf, bytes: Vec<u8>) -> Result<String, String> {
    task::spawn_blocking(move || {
        std::fs::write(&path, &bytes).map_err(|e| format!("Failed to save recording: {}", e))?;
        Ok(path.display().to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_with_no_events_skips_render() {
        let mut machine = SoundMachine::new();
        machine.recorder.start();
        machine.phase = Phase::Recording;

        let _ = machine.update(Message::StopRecording);

        assert_eq!(machine.phase, Phase::Idle);
        assert_eq!(machine.feedback, "No sounds were recorded.");
        assert!(machine.artifact.is_none());
    }

    #[test]
    fn stop_outside_recording_is_rejected() {
        let mut machine = SoundMachine::new();
        machine.phase = Phase::Rendering;

        let _ = machine.update(Message::StopRecording);

        // A stop during an in-flight render must not restart the pipeline
        assert_eq!(machine.phase, Phase::Rendering);
    }

    #[test]
    fn start_is_rejected_while_rendering() {
        let mut machine = SoundMachine::new();
        machine.phase = Phase::Rendering;

        let _ = machine.update(Message::StartRecording);

        assert_eq!(machine.phase, Phase::Rendering);
        assert!(!machine.recorder.is_recording());
    }

    #[test]
    fn starting_a_recording_clears_previous_results() {
        let mut machine = SoundMachine::new();
        machine.sequence.push(SoundId::Kick, 0);
        machine.artifact = Some(encode::wav_fallback(&[0i16; 4], SAMPLE_RATE));

        let _ = machine.update(Message::StartRecording);

        assert_eq!(machine.phase, Phase::Recording);
        assert!(machine.sequence.is_empty());
        assert!(machine.artifact.is_none());
    }

    #[test]
    fn stale_playback_completion_is_ignored() {
        let mut machine = SoundMachine::new();
        machine.is_playing = true;
        machine.feedback = "Playing sequence...".to_string();

        // Generation 7 never existed; the player is at 0
        let _ = machine.update(Message::PlaybackFinished(7));

        assert!(machine.is_playing);
    }

    #[test]
    fn teardown_releases_output() {
        let mut machine = SoundMachine::new();
        machine.is_playing = true;
        machine.teardown();

        assert!(!machine.is_playing);
        assert!(machine.output.is_none());
    }
}
