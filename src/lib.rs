use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use tract_onnx::prelude::tract_ndarray;

mod error;
pub use error::Error;

mod window;
pub use window::{WindowConfig, WindowGeometry};

mod decoder;
pub use decoder::{AudioSource, FileSource, Waveform};

mod resample;
pub use resample::{load_resampled, resample};

mod cache;
pub use cache::{CachedSource, DECODE_CACHE_SLOTS};

mod indexer;
pub use indexer::{build_index, window_offsets};

mod materializer;
pub use materializer::{extract_window, materialize};

mod transform;
pub use transform::{FeatureTransform, RawWaveform};

mod lfcc;
pub use lfcc::Lfcc;

mod onnx;
pub use onnx::OnnxTransform;

mod dataset;
pub use dataset::ChunkDataset;

mod prefetch;
pub use prefetch::Prefetcher;

mod protocol;
pub use protocol::{parse_protocol, read_protocol};

/// An audio file and the class it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub path: PathBuf,
    pub label: String,
}

impl SourceItem {
    pub fn new<P: Into<PathBuf>, L: Into<String>>(path: P, label: L) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// One analysis window: which file, which class, and where the window starts
/// (in samples at the configured rate). `padded` windows run past the end of
/// their file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub source_path: PathBuf,
    pub label: usize,
    pub start_offset: usize,
    pub padded: bool,
}

/// A materialized window: features shaped (time-steps, channels) plus label.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    pub features: tract_ndarray::Array2<f32>,
    pub label: usize,
}

/// Maps class names to the indices a model is trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(BTreeMap<String, usize>);

impl Default for LabelMap {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("bonafide".to_string(), 0),
            ("spoof".to_string(), 1),
        ]))
    }
}

impl LabelMap {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn index_of(&self, label: &str) -> Result<usize, Error> {
        self.0
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, &v)| v == index)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfccConfig {
    pub n_lfcc: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_filter: usize,
}

impl Default for LfccConfig {
    fn default() -> Self {
        Self {
            n_lfcc: 60,
            n_fft: 512,
            hop_length: 160,
            n_filter: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxConfig {
    pub path: String,
    pub channels: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureConfig {
    Lfcc(LfccConfig),
    Onnx(OnnxConfig),
    Raw,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig::Lfcc(LfccConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub sample_rate: u32,
    /// Window length in seconds.
    pub chunk_length: f64,
    /// Overlap between consecutive windows in seconds.
    pub chunk_overlap: f64,
    pub labels: LabelMap,
    pub features: FeatureConfig,
    pub num_workers: usize,
    pub cache_decoded: bool,
    pub audio_extension: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_length: 2.0,
            chunk_overlap: 1.0,
            labels: LabelMap::default(),
            features: FeatureConfig::default(),
            num_workers: 8,
            cache_decoded: false,
            audio_extension: "flac".to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn window(&self) -> WindowConfig {
        WindowConfig::new(self.chunk_length, self.chunk_overlap, self.sample_rate)
    }

    /// Instantiates the configured feature transform, rejecting windows the
    /// transform could never accept.
    pub fn transform(&self) -> Result<Box<dyn FeatureTransform>, Error> {
        let window_samples = self.window().geometry()?.window_samples();
        let transform: Box<dyn FeatureTransform> = match &self.features {
            FeatureConfig::Lfcc(cfg) => {
                if window_samples <= cfg.n_fft / 2 {
                    return Err(Error::Configuration(format!(
                        "window of {window_samples} samples is too short for lfcc n_fft={}",
                        cfg.n_fft
                    )));
                }
                Box::new(Lfcc::new(self.sample_rate, cfg)?)
            }
            FeatureConfig::Onnx(cfg) => Box::new(OnnxTransform::new(
                &cfg.path,
                window_samples,
                cfg.channels,
                self.sample_rate,
            )?),
            FeatureConfig::Raw => Box::new(RawWaveform),
        };
        Ok(transform)
    }
}
