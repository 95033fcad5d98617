/// Audio artifact encoding
///
/// The rendered PCM timeline is encoded to MP3 (CBR 128kbps stereo) in
/// fixed-size chunks to bound peak memory. Any encoder failure, including
/// the encoder failing to initialize, falls back to an uncompressed WAV
/// container instead of failing the recording. The chosen format travels
/// with the bytes as an explicit tag so the export step can pick the right
/// file extension without inspecting the data.

use mp3lame_encoder::{Builder, DualPcm, FlushNoGap};
use thiserror::Error;

/// MP3 frame size; encoding feeds the encoder this many frames at a time
const MP3_CHUNK_FRAMES: usize = 1152;

/// Which container the artifact ended up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension for the export filename
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

/// An encoded audio artifact with its format tag
#[derive(Debug, Clone)]
pub struct Encoded {
    pub format: AudioFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("MP3 encoder unavailable")]
    Unavailable,
    #[error("MP3 encoder setup failed: {0}")]
    Setup(String),
    #[error("MP3 encoding failed: {0}")]
    Encode(String),
}

/// Encode interleaved 16-bit stereo PCM, preferring MP3.
///
/// Returns the artifact and, when the MP3 path failed and WAV was used
/// instead, the error that forced the fallback (a soft notice, not a hard
/// failure).
pub fn encode(samples: &[i16], sample_rate: u32) -> (Encoded, Option<EncodeError>) {
    encode_with(samples, sample_rate, encode_mp3)
}

/// The encode pipeline with the MP3 step injectable, so the fallback branch
/// can be driven without a real encoder failure
fn encode_with(
    samples: &[i16],
    sample_rate: u32,
    mp3: impl Fn(&[i16], u32) -> Result<Vec<u8>, EncodeError>,
) -> (Encoded, Option<EncodeError>) {
    match mp3(samples, sample_rate) {
        Ok(bytes) => (
            Encoded {
                format: AudioFormat::Mp3,
                bytes,
            },
            None,
        ),
        Err(err) => {
            eprintln!("⚠️  MP3 encoding failed ({}), falling back to WAV", err);
            (wav_fallback(samples, sample_rate), Some(err))
        }
    }
}

/// The uncompressed fallback artifact
pub fn wav_fallback(samples: &[i16], sample_rate: u32) -> Encoded {
    Encoded {
        format: AudioFormat::Wav,
        bytes: encode_wav(samples, sample_rate, 2),
    }
}

fn encode_mp3(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
    let mut builder = Builder::new().ok_or(EncodeError::Unavailable)?;
    builder
        .set_num_channels(2)
        .map_err(|e| EncodeError::Setup(format!("{:?}", e)))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| EncodeError::Setup(format!("{:?}", e)))?;
    builder
        .set_brate(mp3lame_encoder::Bitrate::Kbps128)
        .map_err(|e| EncodeError::Setup(format!("{:?}", e)))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Good)
        .map_err(|e| EncodeError::Setup(format!("{:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| EncodeError::Setup(format!("{:?}", e)))?;

    let frames = samples.len() / 2;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for pair in samples.chunks_exact(2) {
        left.push(pair[0]);
        right.push(pair[1]);
    }

    // Feed the encoder one MP3 frame at a time so peak memory stays small
    let mut out = Vec::new();
    let mut start = 0;
    while start < frames {
        let end = (start + MP3_CHUNK_FRAMES).min(frames);
        let input = DualPcm {
            left: &left[start..end],
            right: &right[start..end],
        };

        out.reserve(mp3lame_encoder::max_required_buffer_size(end - start));
        let written = encoder
            .encode(input, out.spare_capacity_mut())
            .map_err(|e| EncodeError::Encode(format!("{:?}", e)))?;
        // SAFETY: the encoder wrote exactly `written` bytes into the
        // reserved spare capacity
        unsafe { out.set_len(out.len() + written) };

        start = end;
    }

    out.reserve(mp3lame_encoder::max_required_buffer_size(MP3_CHUNK_FRAMES));
    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| EncodeError::Encode(format!("{:?}", e)))?;
    // SAFETY: as above
    unsafe { out.set_len(out.len() + written) };

    Ok(out)
}

/// Encode interleaved 16-bit PCM as a WAV byte buffer:
/// standard 44-byte RIFF/WAVE header followed by little-endian samples.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let bytes_per_sample = bits_per_sample / 8;
    let block_align = channels * bytes_per_sample;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * bytes_per_sample as usize) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk: 16-byte PCM description
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_and_length() {
        // 100 stereo frames = 200 interleaved samples
        let samples = vec![0i16; 200];
        let wav = encode_wav(&samples, 44_100, 2);

        // 44-byte header + 2 bytes per channel per frame
        assert_eq!(wav.len(), 44 + 2 * 2 * 100);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        // Little-endian header fields
        let riff_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        assert_eq!(riff_size, 36 + 400);
        let format = u16::from_le_bytes([wav[20], wav[21]]);
        assert_eq!(format, 1); // PCM
        let channels = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(channels, 2);
        let sample_rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sample_rate, 44_100);
        let byte_rate = u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]);
        assert_eq!(byte_rate, 44_100 * 4);
        let block_align = u16::from_le_bytes([wav[32], wav[33]]);
        assert_eq!(block_align, 4);
        let bits = u16::from_le_bytes([wav[34], wav[35]]);
        assert_eq!(bits, 16);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 400);
    }

    #[test]
    fn wav_samples_are_little_endian() {
        let wav = encode_wav(&[0x0102i16, -2], 44_100, 2);
        assert_eq!(&wav[44..48], &[0x02, 0x01, 0xfe, 0xff]);
    }

    #[test]
    fn fallback_artifact_is_wav_tagged() {
        let samples = vec![0i16; 88_200]; // 1 second of stereo
        let artifact = wav_fallback(&samples, 44_100);

        assert_eq!(artifact.format, AudioFormat::Wav);
        assert_eq!(artifact.bytes.len(), 44 + 2 * samples.len());
        assert_eq!(&artifact.bytes[0..4], b"RIFF");
    }

    #[test]
    fn extension_follows_format() {
        assert_eq!(AudioFormat::Mp3.extension(), "mp3");
        assert_eq!(AudioFormat::Wav.extension(), "wav");

        let artifact = wav_fallback(&[0i16; 4], 44_100);
        assert_eq!(artifact.format.extension(), "wav");
    }

    #[test]
    fn failed_mp3_encode_falls_back_to_wav() {
        let samples = vec![0i16; 200];
        let (artifact, notice) = encode_with(&samples, 44_100, |_, _| {
            Err(EncodeError::Unavailable)
        });

        assert_eq!(artifact.format, AudioFormat::Wav);
        assert_eq!(&artifact.bytes[0..4], b"RIFF");
        assert_eq!(artifact.bytes.len(), 44 + 2 * samples.len());
        assert!(matches!(notice, Some(EncodeError::Unavailable)));
    }

    #[test]
    fn empty_timeline_still_produces_valid_wav() {
        let wav = encode_wav(&[], 44_100, 2);
        assert_eq!(wav.len(), 44);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 0);
    }
}
