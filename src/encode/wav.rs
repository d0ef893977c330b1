//! 16-bit PCM RIFF/WAVE serialisation.

use crate::error::{MashupError, Result};
use crate::render::buffer::StereoBuffer;

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;

/// Encode a rendered stereo buffer.
pub fn encode_stereo(buffer: &StereoBuffer) -> Result<Vec<u8>> {
    encode_wav(&[buffer.left.as_slice(), buffer.right.as_slice()], buffer.sample_rate)
}

/// Encode planar float channels as an interleaved 16-bit PCM WAVE file.
///
/// Samples are clamped to [-1, 1]; negatives scale by 32768 and the rest by
/// 32767 so both ends of the i16 range are reachable.
pub fn encode_wav(channels: &[&[f32]], sample_rate: u32) -> Result<Vec<u8>> {
    let Some(first) = channels.first() else {
        return Err(MashupError::Encode("no channels to encode".into()));
    };
    let frames = first.len();
    if channels.iter().any(|c| c.len() != frames) {
        return Err(MashupError::Encode("channel buffers differ in length".into()));
    }

    let num_channels = u16::try_from(channels.len())
        .map_err(|_| MashupError::Encode(format!("too many channels: {}", channels.len())))?;
    let block_align = num_channels
        .checked_mul(BITS_PER_SAMPLE / 8)
        .ok_or_else(|| MashupError::Encode("block align overflows u16".into()))?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| MashupError::Encode("byte rate overflows u32".into()))?;
    let data_len = (frames as u64) * block_align as u64;
    if data_len + 36 > u32::MAX as u64 {
        return Err(MashupError::Encode(format!(
            "{} bytes of audio do not fit in a RIFF chunk",
            data_len
        )));
    }
    let data_len = data_len as u32;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_len as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // integer PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        for channel in channels {
            buf.extend_from_slice(&quantize(channel[i]).to_le_bytes());
        }
    }

    Ok(buf)
}

#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}
