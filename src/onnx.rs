use std::path::Path;

use tract_onnx::prelude::*;

use crate::{Error, FeatureTransform};

/// OnnxTransform runs a feature front-end exported as an ONNX graph.
///
/// The graph takes a `[1, window_samples]` float waveform. Whatever it
/// outputs is read row-major and folded into rows of `channels` values.
pub struct OnnxTransform {
    model: TypedRunnableModel<TypedModel>,
    window_samples: usize,
    channels: usize,
    sample_rate: u32,
}

impl OnnxTransform {
    pub fn new<P: AsRef<Path>>(
        path: P,
        window_samples: usize,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, Error> {
        if window_samples == 0 || channels == 0 {
            return Err(Error::Configuration(format!(
                "onnx transform needs a non-empty window ({window_samples}) and channels ({channels})"
            )));
        }

        let model = tract_onnx::onnx()
            // load the model
            .model_for_path(path.as_ref())
            .and_then(|m| m.with_input_fact(0, f32::fact([1, window_samples]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(Error::Transform)?;
        log::debug!(
            "loaded onnx feature model {} for {} sample windows",
            path.as_ref().display(),
            window_samples
        );

        Ok(Self {
            model,
            window_samples,
            channels,
            sample_rate,
        })
    }
}

impl FeatureTransform for OnnxTransform {
    fn apply(&self, segment: &[f32], sample_rate: u32) -> Result<tract_ndarray::Array2<f32>, Error> {
        if sample_rate != self.sample_rate || segment.len() != self.window_samples {
            return Err(Error::Configuration(format!(
                "onnx model expects {} samples @ {}Hz, got {} @ {}Hz",
                self.window_samples,
                self.sample_rate,
                segment.len(),
                sample_rate
            )));
        }

        let input = Tensor::from_shape(&[1, segment.len()], segment).map_err(Error::Transform)?;
        let out = self
            .model
            .run(tvec!(input.into()))
            .map_err(Error::Transform)?
            .remove(0);
        let values = out.as_slice::<f32>().map_err(Error::Transform)?;
        if values.len() % self.channels != 0 {
            return Err(Error::Transform(anyhow::anyhow!(
                "model produced {} values, not a multiple of {} channels",
                values.len(),
                self.channels
            )));
        }

        tract_ndarray::Array2::from_shape_vec(
            (values.len() / self.channels, self.channels),
            values.to_vec(),
        )
        .map_err(|e| Error::Transform(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_a_transform_error() {
        let err = OnnxTransform::new("/no/such/model.onnx", 32000, 32, 16000)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Transform(_)));
    }

    #[test]
    fn empty_shape_is_rejected_before_loading() {
        let err = OnnxTransform::new("/no/such/model.onnx", 0, 32, 16000)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
