use crate::{
    load_resampled, AudioSource, ChunkEntry, Error, FeatureTransform, WindowConfig, WindowSample,
};

/// Copies `window_samples` samples starting at `offset`, padding the end with
/// zeros where the source runs out.
pub fn extract_window(samples: &[f32], offset: usize, window_samples: usize) -> Vec<f32> {
    let mut out = vec![0f32; window_samples];
    if offset < samples.len() {
        let end = (offset + window_samples).min(samples.len());
        out[..end - offset].copy_from_slice(&samples[offset..end]);
    }
    out
}

/// Produces the feature matrix and label for one index entry.
///
/// The source is decoded from scratch on every call; wrap the source in a
/// [`crate::CachedSource`] to avoid repeated decodes.
pub fn materialize<S, T>(
    entry: &ChunkEntry,
    window: &WindowConfig,
    source: &S,
    transform: &T,
) -> Result<WindowSample, Error>
where
    S: AudioSource + ?Sized,
    T: FeatureTransform + ?Sized,
{
    let geometry = window.geometry()?;
    let samples = load_resampled(source, &entry.source_path, window.sample_rate)?;
    let segment = extract_window(&samples, entry.start_offset, geometry.window_samples());
    let features = transform.apply(&segment, window.sample_rate)?;

    Ok(WindowSample {
        features,
        label: entry.label,
    })
}
