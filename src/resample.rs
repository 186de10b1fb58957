use std::path::Path;

use rubato::{FftFixedIn, Resampler};

use crate::{AudioSource, Error};

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resamples mono audio from `from_rate` to `to_rate`.
///
/// The output holds `round(len * to_rate / from_rate)` samples with the
/// resampler's group delay already removed, so sample `i` of the output lines
/// up with time `i / to_rate` of the input.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, Error> {
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Configuration(format!(
            "cannot resample {from_rate}Hz -> {to_rate}Hz"
        )));
    }
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let expected = (input.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK, SUB_CHUNKS, 1)?;
    let delay = resampler.output_delay();

    let mut out = Vec::with_capacity(expected + delay + CHUNK);
    let mut pos = 0;
    // Keep feeding (zero-padded past the end) until the delayed tail is flushed.
    while out.len() < delay + expected {
        let need = resampler.input_frames_next();
        let mut block = vec![0f32; need];
        if pos < input.len() {
            let end = (pos + need).min(input.len());
            block[..end - pos].copy_from_slice(&input[pos..end]);
        }
        pos += need;

        let frames = resampler.process(&[block], None)?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}

/// Decodes `path` and brings it to `sample_rate`. Both the indexer and the
/// materializer load audio through here so they always agree on lengths.
pub fn load_resampled<S: AudioSource + ?Sized>(
    source: &S,
    path: &Path,
    sample_rate: u32,
) -> Result<Vec<f32>, Error> {
    let wave = source.decode(path)?;
    if wave.sample_rate == sample_rate {
        return Ok(wave.samples);
    }
    log::trace!(
        "resampling {} from {}Hz to {}Hz",
        path.display(),
        wave.sample_rate,
        sample_rate
    );
    resample(&wave.samples, wave.sample_rate, sample_rate)
}
