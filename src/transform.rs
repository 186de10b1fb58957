use tract_onnx::prelude::tract_ndarray::Array2;

use crate::Error;

/// FeatureTransform turns a fixed-length waveform segment into a feature
/// matrix shaped (time-steps, channels). Every segment of a given length must
/// produce the same shape.
pub trait FeatureTransform: Send + Sync {
    fn apply(&self, segment: &[f32], sample_rate: u32) -> Result<Array2<f32>, Error>;
}

impl<T: FeatureTransform + ?Sized> FeatureTransform for &T {
    fn apply(&self, segment: &[f32], sample_rate: u32) -> Result<Array2<f32>, Error> {
        (**self).apply(segment, sample_rate)
    }
}

impl<T: FeatureTransform + ?Sized> FeatureTransform for Box<T> {
    fn apply(&self, segment: &[f32], sample_rate: u32) -> Result<Array2<f32>, Error> {
        (**self).apply(segment, sample_rate)
    }
}

/// Passes the waveform through untouched as a single-channel column.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawWaveform;

impl FeatureTransform for RawWaveform {
    fn apply(&self, segment: &[f32], _sample_rate: u32) -> Result<Array2<f32>, Error> {
        Array2::from_shape_vec((segment.len(), 1), segment.to_vec())
            .map_err(|e| Error::Transform(e.into()))
    }
}
