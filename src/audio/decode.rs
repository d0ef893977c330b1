use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{MashupError, Result};

/// A fully materialised PCM track: one buffer per channel, all the same
/// length. Never mutated after construction.
#[derive(Clone, Debug)]
pub struct DecodedTrack {
    pub id: String,
    pub sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedTrack {
    pub fn new(id: impl Into<String>, sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        let id = id.into();
        if sample_rate == 0 {
            return Err(MashupError::decode(&id, "sample rate must be positive"));
        }
        let Some(first) = channels.first() else {
            return Err(MashupError::decode(&id, "no channels"));
        };
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(MashupError::decode(&id, "channel buffers differ in length"));
        }
        Ok(Self {
            id,
            sample_rate,
            channels,
        })
    }

    /// Mono convenience constructor, mostly for synthetic input.
    pub fn mono(id: impl Into<String>, sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(id, sample_rate, vec![samples])
    }

    /// Samples of one channel, or `None` past the last channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Channel 0. Every track has at least one channel.
    pub fn primary(&self) -> &[f32] {
        &self.channels[0]
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Resolve one input (local path or http(s) URL) into a decoded track.
pub fn load_track(source: &str) -> Result<DecodedTrack> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_decoded_audio(source)
    } else {
        decode_file(Path::new(source))
    }
}

pub fn fetch_decoded_audio(url: &str) -> Result<DecodedTrack> {
    log::info!("Fetching {}", url);
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let bytes = client.get(url).send()?.error_for_status()?.bytes()?;

    let ext = url
        .rsplit('/')
        .next()
        .and_then(|name| name.split('?').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext);

    decode_bytes(url, bytes.to_vec(), ext)
}

pub fn decode_file(path: &Path) -> Result<DecodedTrack> {
    let id = path.display().to_string();
    let file = std::fs::File::open(path)
        .map_err(|e| MashupError::decode(&id, format!("failed to open file: {e}")))?;
    let ext = path.extension().and_then(|e| e.to_str());
    decode_source(&id, Box::new(file), ext)
}

pub fn decode_bytes(id: &str, bytes: Vec<u8>, ext: Option<&str>) -> Result<DecodedTrack> {
    decode_source(id, Box::new(Cursor::new(bytes)), ext)
}

fn decode_source(id: &str, source: Box<dyn MediaSource>, ext: Option<&str>) -> Result<DecodedTrack> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| MashupError::decode(id, format!("failed to probe format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| MashupError::decode(id, "no audio tracks found"))?;

    let track_id = track.id;
    let mut channel_count = track.codec_params.channels.map_or(1, |c| c.count());
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| MashupError::decode(id, format!("failed to create decoder: {e}")))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(MashupError::decode(id, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(MashupError::decode(id, e)),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        if spec.channels.count() != channel_count {
            if channels.iter().any(|c| !c.is_empty()) {
                return Err(MashupError::decode(id, "channel layout changed mid-stream"));
            }
            channel_count = spec.channels.count();
            channels = vec![Vec::new(); channel_count];
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks(channel_count) {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
        }
    }

    if channels.first().map_or(true, |c| c.is_empty()) {
        return Err(MashupError::decode(id, "stream contains no samples"));
    }

    let track = DecodedTrack::new(id, sample_rate, channels)?;

    log::info!(
        "Decoded '{}': {} frames, {} ch, {}Hz, {:.1}s",
        track.id,
        track.frames(),
        track.channel_count(),
        track.sample_rate,
        track.duration()
    );

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_channel_lengths() {
        let err = DecodedTrack::new("bad", 44100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, MashupError::Decode { .. }));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(DecodedTrack::mono("bad", 0, vec![0.0; 10]).is_err());
    }

    #[test]
    fn duration_derives_from_frames() {
        let track = DecodedTrack::mono("t", 1000, vec![0.0; 2500]).unwrap();
        assert_eq!(track.frames(), 2500);
        assert_eq!(track.primary().len(), 2500);
        assert!(track.channel(1).is_none());
        assert!((track.duration() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_bytes("noise", vec![7u8; 512], None).unwrap_err();
        assert!(matches!(err, MashupError::Decode { .. }));
    }
}
