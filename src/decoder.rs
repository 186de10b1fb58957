use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::Error;

/// Mono samples at their native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Anything that can turn a path into a mono waveform.
pub trait AudioSource: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Waveform, Error>;
}

impl<S: AudioSource + ?Sized> AudioSource for &S {
    fn decode(&self, path: &Path) -> Result<Waveform, Error> {
        (**self).decode(path)
    }
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn decode(&self, path: &Path) -> Result<Waveform, Error> {
        (**self).decode(path)
    }
}

/// FileSource decodes audio files from disk with symphonia. Multi-channel
/// audio is averaged down to a single channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl AudioSource for FileSource {
    fn decode(&self, path: &Path) -> Result<Waveform, Error> {
        let src = File::open(path).map_err(|e| Error::decode(path, e))?;
        let mss = MediaSourceStream::new(Box::new(src), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::decode(path, e))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::decode(path, "no decodable audio track"))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::decode(path, "audio track has no sample rate"))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::decode(path, e))?;

        let mut samples = Vec::with_capacity(codec_params.n_frames.unwrap_or(0) as usize);
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => {
                    log::warn!(
                        "{}: stream reset mid-file, keeping the first {} samples",
                        path.display(),
                        samples.len()
                    );
                    break;
                }
                Err(e) => return Err(Error::decode(path, e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                // A corrupt packet loses its samples but the stream stays usable.
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("{}: skipping bad packet: {}", path.display(), msg);
                    continue;
                }
                Err(e) => return Err(Error::decode(path, e)),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend(
                buf.samples()
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }

        log::trace!(
            "decoded {} samples @ {}Hz from {}",
            samples.len(),
            sample_rate,
            path.display()
        );
        Ok(Waveform {
            samples,
            sample_rate,
        })
    }
}
