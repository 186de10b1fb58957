use crate::{
    build_index, materialize, AudioSource, ChunkEntry, Error, FeatureTransform, LabelMap,
    SourceItem, WindowConfig, WindowSample,
};

/// ChunkDataset exposes every analysis window of a list of files as one flat,
/// randomly indexable collection.
///
/// The window index is built once, up front. Samples are produced on demand
/// by [`ChunkDataset::get`] and never retained.
pub struct ChunkDataset<S, T> {
    entries: Vec<ChunkEntry>,
    window: WindowConfig,
    labels: LabelMap,
    source: S,
    transform: T,
}

impl<S: AudioSource, T: FeatureTransform> ChunkDataset<S, T> {
    pub fn new(
        items: &[SourceItem],
        window: WindowConfig,
        labels: LabelMap,
        source: S,
        transform: T,
    ) -> Result<Self, Error> {
        let entries = build_index(items, &window, &labels, &source)?;
        Ok(Self::from_entries(entries, window, labels, source, transform))
    }

    /// Wraps an index built earlier (or loaded from disk).
    pub fn from_entries(
        entries: Vec<ChunkEntry>,
        window: WindowConfig,
        labels: LabelMap,
        source: S,
        transform: T,
    ) -> Self {
        Self {
            entries,
            window,
            labels,
            source,
            transform,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<WindowSample, Error> {
        let entry = self.entries.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;
        materialize(entry, &self.window, &self.source, &self.transform)
    }

    pub fn entries(&self) -> &[ChunkEntry] {
        &self.entries
    }

    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Number of windows per class index.
    pub fn class_counts(&self) -> Vec<(usize, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.label).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawWaveform, Waveform};
    use std::path::Path;

    struct Tones;

    impl AudioSource for Tones {
        fn decode(&self, path: &Path) -> Result<Waveform, Error> {
            let len = match path.to_str() {
                Some("long.wav") => 50,
                Some("short.wav") => 7,
                _ => return Err(Error::decode(path, "no such file")),
            };
            Ok(Waveform {
                samples: (0..len).map(|i| i as f32 + 1.0).collect(),
                sample_rate: 10,
            })
        }
    }

    fn dataset() -> ChunkDataset<Tones, RawWaveform> {
        ChunkDataset::new(
            &[
                SourceItem::new("long.wav", "bonafide"),
                SourceItem::new("short.wav", "spoof"),
            ],
            WindowConfig::new(2.0, 0.5, 10),
            LabelMap::default(),
            Tones,
            RawWaveform,
        )
        .unwrap()
    }

    #[test]
    fn len_and_get() {
        let ds = dataset();
        // long: offsets 0,15,30 fit (30+20=50); short: one padded window
        assert_eq!(ds.len(), 4);
        assert!(!ds.is_empty());

        let s = ds.get(2).unwrap();
        assert_eq!(s.label, 0);
        assert_eq!(s.features[[0, 0]], 31.0);

        let s = ds.get(3).unwrap();
        assert_eq!(s.label, 1);
        assert_eq!(s.features.dim(), (20, 1));
        assert_eq!(s.features[[6, 0]], 7.0);
        assert_eq!(s.features[[7, 0]], 0.0);

        assert_eq!(ds.class_counts(), vec![(0, 3), (1, 1)]);
    }

    #[test]
    fn out_of_range() {
        let ds = dataset();
        assert!(matches!(
            ds.get(4),
            Err(Error::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn from_entries_round_trips_through_yaml() {
        let ds = dataset();
        let text = serde_yaml::to_string(ds.entries()).unwrap();
        let entries: Vec<ChunkEntry> = serde_yaml::from_str(&text).unwrap();
        let again = ChunkDataset::from_entries(
            entries,
            *ds.window(),
            ds.labels().clone(),
            Tones,
            RawWaveform,
        );
        for i in 0..ds.len() {
            assert_eq!(ds.get(i).unwrap(), again.get(i).unwrap());
        }
    }
}
