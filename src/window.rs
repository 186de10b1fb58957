use crate::Error;

/// Window length and overlap in seconds, at a target sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    pub window_length_seconds: f64,
    pub overlap_seconds: f64,
    pub sample_rate: u32,
}

/// The sample-domain shape of a [`WindowConfig`].
///
/// Only [`WindowConfig::geometry`] builds one, so `0 < stride <= window_samples`
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    window_samples: usize,
    overlap_samples: usize,
    stride: usize,
}

impl WindowGeometry {
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn overlap_samples(&self) -> usize {
        self.overlap_samples
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl WindowConfig {
    pub fn new(window_length_seconds: f64, overlap_seconds: f64, sample_rate: u32) -> Self {
        Self {
            window_length_seconds,
            overlap_seconds,
            sample_rate,
        }
    }

    /// Converts the window to sample counts, rejecting any configuration
    /// that cannot produce a positive stride.
    pub fn geometry(&self) -> Result<WindowGeometry, Error> {
        let (w, v) = (self.window_length_seconds, self.overlap_seconds);
        if !w.is_finite() || !v.is_finite() {
            return Err(Error::Configuration(format!(
                "window ({w}s) and overlap ({v}s) must be finite"
            )));
        }
        if v < 0.0 || w <= v {
            return Err(Error::Configuration(format!(
                "need window_length > overlap >= 0, got window_length={w}s overlap={v}s"
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::Configuration("sample_rate must be > 0".into()));
        }

        let sr = self.sample_rate as f64;
        if (w * sr).round() > u32::MAX as f64 {
            return Err(Error::Configuration(format!(
                "window of {w}s at {}Hz is too many samples",
                self.sample_rate
            )));
        }
        let window_samples = (w * sr).round() as usize;
        let overlap_samples = (v * sr).round() as usize;
        if window_samples == 0 || window_samples <= overlap_samples {
            return Err(Error::Configuration(format!(
                "window of {window_samples} samples with {overlap_samples} samples overlap has no positive stride"
            )));
        }

        Ok(WindowGeometry {
            window_samples,
            overlap_samples,
            stride: window_samples - overlap_samples,
        })
    }
}
