use std::path::PathBuf;

/// Errors produced while indexing or materializing audio windows.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Window, overlap, sample-rate or transform parameters are unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A source file could not be opened or decoded.
    #[error("failed to decode {}: {source}", .path.display())]
    AudioDecode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("label {0:?} is not in the label map")]
    UnknownLabel(String),

    #[error("index {index} out of range for dataset of {len} windows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("protocol line {line}: {reason}")]
    Protocol { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("resampling failed: {0}")]
    Resample(String),

    /// The feature transform rejected its input or failed to run.
    #[error("feature transform failed: {0}")]
    Transform(#[source] anyhow::Error),

    #[error(transparent)]
    ConfigFile(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn decode<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::AudioDecode {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<rubato::ResamplerConstructionError> for Error {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        Error::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for Error {
    fn from(e: rubato::ResampleError) -> Self {
        Error::Resample(e.to_string())
    }
}
