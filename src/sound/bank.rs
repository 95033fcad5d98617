/// Pad sample bank
///
/// Decodes the five pad sounds into interleaved stereo f32 buffers at the
/// engine sample rate. Sounds ship as WAV or MP3 under assets/audio; when a
/// file is missing or fails to decode, a built-in synthesized version of the
/// sound is used instead so the pads stay playable. At render time a sound
/// that is genuinely absent from the bank skips its events only.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::sequence::{SoundId, SAMPLE_RATE};

/// A decoded pad sound: interleaved stereo f32 at the engine sample rate
#[derive(Debug, Clone)]
pub struct Sample {
    frames: Arc<Vec<f32>>,
}

impl Sample {
    pub fn new(interleaved: Vec<f32>) -> Self {
        Sample {
            frames: Arc::new(interleaved),
        }
    }

    /// Interleaved stereo samples
    pub fn data(&self) -> &[f32] {
        &self.frames
    }

    /// Shared handle to the sample data, for handing to playback threads
    pub fn shared(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.frames)
    }

    /// Number of stereo frames
    pub fn frame_count(&self) -> usize {
        self.frames.len() / 2
    }
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Decoded-sample cache for the five pad sounds
#[derive(Debug)]
pub struct SampleBank {
    samples: HashMap<SoundId, Sample>,
}

impl SampleBank {
    /// Load every pad sound from the assets directory, synthesizing any
    /// sound whose file is missing or undecodable.
    pub fn load(assets_dir: &Path) -> Self {
        let mut samples = HashMap::new();

        for sound in SoundId::ALL {
            let sample = match load_sound_file(assets_dir, sound) {
                Ok(Some(sample)) => {
                    println!("🔊 Loaded {} from assets", sound.name());
                    sample
                }
                Ok(None) => Sample::new(synthesize(sound)),
                Err(err) => {
                    eprintln!("⚠️  {}, using built-in {}", err, sound.name());
                    Sample::new(synthesize(sound))
                }
            };
            samples.insert(sound, sample);
        }

        SampleBank { samples }
    }

    /// Build a bank directly from decoded samples (used by tests and the
    /// render pipeline's fixtures)
    pub fn from_samples(samples: HashMap<SoundId, Sample>) -> Self {
        SampleBank { samples }
    }

    pub fn get(&self, sound: SoundId) -> Option<&Sample> {
        self.samples.get(&sound)
    }
}

/// Try the WAV then MP3 asset for a sound.
/// Ok(None) means neither file exists; Err means a file existed but failed.
fn load_sound_file(assets_dir: &Path, sound: SoundId) -> Result<Option<Sample>, BankError> {
    let wav_path = assets_dir.join(format!("{}.wav", sound.file_stem()));
    if wav_path.exists() {
        return decode_wav(&wav_path).map(Some);
    }

    let mp3_path = assets_dir.join(format!("{}.mp3", sound.file_stem()));
    if mp3_path.exists() {
        return decode_mp3(&mp3_path).map(Some);
    }

    Ok(None)
}

fn decode_wav(path: &Path) -> Result<Sample, BankError> {
    let reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(source) => BankError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => BankError::Decode {
            path: path.to_path_buf(),
            reason: format!("{:?}", other),
        },
    })?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / scale)
                .collect()
        }
    };

    if interleaved.is_empty() {
        return Err(BankError::Decode {
            path: path.to_path_buf(),
            reason: "no samples".to_string(),
        });
    }

    Ok(Sample::new(to_engine_stereo(
        &interleaved,
        spec.channels as usize,
        spec.sample_rate,
    )))
}

fn decode_mp3(path: &Path) -> Result<Sample, BankError> {
    let file = std::fs::File::open(path).map_err(|e| BankError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut decoder = minimp3::Decoder::new(file);
    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels = 0usize;
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                channels = frame.channels;
                sample_rate = frame.sample_rate as u32;
                interleaved.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => {
                return Err(BankError::Decode {
                    path: path.to_path_buf(),
                    reason: format!("{:?}", e),
                })
            }
        }
    }

    if interleaved.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(BankError::Decode {
            path: path.to_path_buf(),
            reason: "no audio frames".to_string(),
        });
    }

    Ok(Sample::new(to_engine_stereo(&interleaved, channels, sample_rate)))
}

/// Convert interleaved audio of any channel count and rate into interleaved
/// stereo at the engine sample rate. Mono is duplicated to both channels,
/// extra channels beyond two are ignored.
fn to_engine_stereo(interleaved: &[f32], channels: usize, sample_rate: u32) -> Vec<f32> {
    let channels = channels.max(1);
    let frames = interleaved.len() / channels;

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }

    let left = resample_linear(&left, sample_rate, SAMPLE_RATE);
    let right = resample_linear(&right, sample_rate, SAMPLE_RATE);

    let mut out = Vec::with_capacity(left.len() * 2);
    for (l, r) in left.iter().zip(right.iter()) {
        out.push(*l);
        out.push(*r);
    }
    out
}

/// Linear-interpolation resampling of a mono channel
fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;

        let a = input[idx.min(input.len() - 1)];
        let b = input[(idx + 1).min(input.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

// ---------------------------------------------------------------------------
// Built-in synthesized fallbacks
// ---------------------------------------------------------------------------

/// Cheap deterministic noise source (xorshift32)
struct Noise(u32);

impl Noise {
    fn new(seed: u32) -> Self {
        Noise(seed.max(1))
    }

    fn next(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Synthesize a pad sound as interleaved stereo at the engine rate
pub fn synthesize(sound: SoundId) -> Vec<f32> {
    let mono = match sound {
        SoundId::Kick => synth_kick(),
        SoundId::Snare => synth_snare(),
        SoundId::HiHat => synth_hihat(),
        SoundId::Clap => synth_clap(),
        SoundId::Piano => synth_piano(),
    };

    let mut out = Vec::with_capacity(mono.len() * 2);
    for s in mono {
        out.push(s);
        out.push(s);
    }
    out
}

fn seconds(len: f32) -> usize {
    (len * SAMPLE_RATE as f32) as usize
}

/// Sine with an exponential pitch sweep from 120Hz down to 45Hz
fn synth_kick() -> Vec<f32> {
    let len = seconds(0.35);
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 45.0 + 75.0 * (-t * 18.0).exp();
            phase += freq / SAMPLE_RATE as f32;
            (2.0 * PI * phase).sin() * (-t * 9.0).exp() * 0.9
        })
        .collect()
}

/// Tone plus noise burst
fn synth_snare() -> Vec<f32> {
    let len = seconds(0.25);
    let mut noise = Noise::new(0x5eed);
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let tone = (2.0 * PI * 180.0 * t).sin() * 0.4 * (-t * 25.0).exp();
            let hiss = noise.next() * 0.5 * (-t * 18.0).exp();
            tone + hiss
        })
        .collect()
}

/// Short bright noise burst; first-difference filtering keeps only the highs
fn synth_hihat() -> Vec<f32> {
    let len = seconds(0.08);
    let mut noise = Noise::new(0x4a77);
    let mut prev = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let n = noise.next();
            let high = n - prev;
            prev = n;
            high * 0.5 * (-t * 55.0).exp()
        })
        .collect()
}

/// Three stacked noise bursts a few milliseconds apart
fn synth_clap() -> Vec<f32> {
    let len = seconds(0.3);
    let mut noise = Noise::new(0xc1a9);
    let bursts = [0.0f32, 0.02, 0.04];
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env: f32 = bursts
                .iter()
                .filter(|&&b| t >= b)
                .map(|&b| (-(t - b) * 40.0).exp())
                .sum();
            noise.next() * env.min(1.0) * 0.45
        })
        .collect()
}

/// Decaying C4 with a couple of harmonics
fn synth_piano() -> Vec<f32> {
    let len = seconds(0.9);
    let base = 261.63f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let fundamental = (2.0 * PI * base * t).sin();
            let second = (2.0 * PI * base * 2.0 * t).sin() * 0.5;
            let third = (2.0 * PI * base * 3.0 * t).sin() * 0.25;
            (fundamental + second + third) * (-t * 4.0).exp() * 0.4
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_sounds_are_audible() {
        for sound in SoundId::ALL {
            let data = synthesize(sound);
            assert!(!data.is_empty(), "{} is empty", sound.name());
            assert_eq!(data.len() % 2, 0, "{} not stereo", sound.name());
            assert!(
                data.iter().any(|s| s.abs() > 0.05),
                "{} is silent",
                sound.name()
            );
            assert!(
                data.iter().all(|s| s.abs() <= 1.5),
                "{} clips badly",
                sound.name()
            );
        }
    }

    #[test]
    fn bank_falls_back_to_synthesis() {
        // Nonexistent directory: every pad must still have a sample
        let bank = SampleBank::load(Path::new("/nonexistent/assets"));
        for sound in SoundId::ALL {
            let sample = bank.get(sound).expect("missing pad sample");
            assert!(sample.frame_count() > 0);
        }
    }

    #[test]
    fn unreadable_wav_reports_io_error() {
        let err = decode_wav(Path::new("/nonexistent/kick.wav")).unwrap_err();
        assert!(matches!(err, BankError::Io { .. }), "got {:?}", err);
    }

    #[test]
    fn resample_identity_at_same_rate() {
        let input = vec![0.0, 0.5, -0.5, 1.0];
        assert_eq!(resample_linear(&input, 44_100, 44_100), input);
    }

    #[test]
    fn resample_halves_and_doubles() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let down = resample_linear(&input, 44_100, 22_050);
        let up = resample_linear(&input, 22_050, 44_100);
        assert!((down.len() as i64 - 50).abs() <= 1);
        assert!((up.len() as i64 - 200).abs() <= 1);
    }

    #[test]
    fn mono_duplicates_to_both_channels() {
        let stereo = to_engine_stereo(&[0.25, -0.25], 1, SAMPLE_RATE);
        assert_eq!(stereo, vec![0.25, 0.25, -0.25, -0.25]);
    }
}
