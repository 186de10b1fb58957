//! End-to-end tests over real WAV files on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use audio_chunk_dataset::*;

fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    for s in samples {
        w.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    w.finalize().unwrap();
}

fn tone(seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32).round() as usize;
    (0..len)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Writes a small corpus plus its protocol file and returns the protocol path.
fn corpus(dir: &Path) -> PathBuf {
    write_wav(&dir.join("T_0001.wav"), 16000, &tone(5.0, 16000));
    write_wav(&dir.join("T_0002.wav"), 16000, &tone(4.5, 16000));
    write_wav(&dir.join("T_0003.wav"), 44100, &tone(5.0, 44100));
    write_wav(&dir.join("T_0004.wav"), 16000, &tone(0.5, 16000));

    let protocol = dir.join("protocol.txt");
    std::fs::write(
        &protocol,
        "SPK T_0001 - - bonafide\n\
         SPK T_0002 - A01 spoof\n\
         SPK T_0003 - - bonafide\n\
         SPK T_0004 - A02 spoof\n",
    )
    .unwrap();
    protocol
}

fn offsets(entries: &[ChunkEntry], file: &str) -> Vec<(usize, bool)> {
    entries
        .iter()
        .filter(|e| e.source_path.file_name().unwrap() == file)
        .map(|e| (e.start_offset, e.padded))
        .collect()
}

#[test]
fn index_over_decoded_files() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();
    assert_eq!(items.len(), 4);

    let config = DatasetConfig::default();
    let entries = build_index(&items, &config.window(), &config.labels, &FileSource).unwrap();

    assert_eq!(
        offsets(&entries, "T_0001.wav"),
        vec![(0, false), (16000, false), (32000, false), (48000, false)]
    );
    assert_eq!(
        offsets(&entries, "T_0002.wav"),
        vec![(0, false), (16000, false), (32000, false), (48000, true)]
    );
    // 5s at 44.1kHz resamples to exactly 80000 samples
    assert_eq!(
        offsets(&entries, "T_0003.wav"),
        vec![(0, false), (16000, false), (32000, false), (48000, false)]
    );
    assert_eq!(offsets(&entries, "T_0004.wav"), vec![(0, true)]);

    let labels: Vec<usize> = entries.iter().map(|e| e.label).collect();
    assert_eq!(labels, vec![0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 1]);
}

#[test]
fn lfcc_windows_have_fixed_shape() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();

    let config = DatasetConfig::default();
    let dataset = ChunkDataset::new(
        &items,
        config.window(),
        config.labels.clone(),
        FileSource,
        config.transform().unwrap(),
    )
    .unwrap();
    assert_eq!(dataset.len(), 13);

    for i in [0, 7, 8, 12] {
        let sample = dataset.get(i).unwrap();
        assert_eq!(sample.features.dim(), (201, 60), "window {i}");
        assert!(sample.features.iter().all(|v| v.is_finite()));
        assert_eq!(sample.label, dataset.entries()[i].label);
    }

    // same entry twice, same numbers
    assert_eq!(dataset.get(7).unwrap(), dataset.get(7).unwrap());
}

#[test]
fn padded_windows_end_in_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();

    let window = WindowConfig::new(2.0, 1.0, 16000);
    let dataset = ChunkDataset::new(
        &items,
        window,
        LabelMap::default(),
        FileSource,
        RawWaveform,
    )
    .unwrap();

    // T_0002 tail: 24000 real samples then 8000 zeros
    let tail = dataset.get(7).unwrap();
    let col = tail.features.column(0);
    assert_eq!(col.len(), 32000);
    assert!(col.iter().take(24000).any(|&v| v != 0.0));
    assert!(col.iter().skip(24000).all(|&v| v == 0.0));

    // T_0004: 8000 real samples, W - L = 24000 zeros
    let short = dataset.get(12).unwrap();
    let col = short.features.column(0);
    assert!(col.iter().take(8000).any(|&v| v != 0.0));
    assert_eq!(col.iter().skip(8000).filter(|&&v| v == 0.0).count(), 24000);
}

#[test]
fn cached_source_matches_uncached() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();
    let window = WindowConfig::new(2.0, 1.0, 16000);

    let plain =
        ChunkDataset::new(&items, window, LabelMap::default(), FileSource, RawWaveform).unwrap();
    let cached = ChunkDataset::new(
        &items,
        window,
        LabelMap::default(),
        CachedSource::new(FileSource),
        RawWaveform,
    )
    .unwrap();

    assert_eq!(plain.entries(), cached.entries());
    for i in (0..plain.len()).rev() {
        assert_eq!(plain.get(i).unwrap(), cached.get(i).unwrap());
    }
}

#[test]
fn file_removed_after_indexing_fails_materialization() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();
    let dataset = ChunkDataset::new(
        &items,
        WindowConfig::new(2.0, 1.0, 16000),
        LabelMap::default(),
        FileSource,
        RawWaveform,
    )
    .unwrap();

    std::fs::remove_file(dir.path().join("T_0002.wav")).unwrap();
    assert!(dataset.get(0).is_ok());
    assert!(matches!(
        dataset.get(5),
        Err(Error::AudioDecode { .. })
    ));
}

#[test]
fn prefetch_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = corpus(dir.path());
    let items = read_protocol(&protocol, dir.path(), "wav").unwrap();
    let dataset = Arc::new(
        ChunkDataset::new(
            &items,
            WindowConfig::new(2.0, 1.0, 16000),
            LabelMap::default(),
            CachedSource::new(FileSource),
            Lfcc::new(16000, &LfccConfig::default()).unwrap(),
        )
        .unwrap(),
    );

    let mut got: Vec<usize> = Prefetcher::start(dataset.clone(), (0..dataset.len()).collect(), 4)
        .unwrap()
        .map(|(i, r)| {
            assert_eq!(r.unwrap().features.dim(), (201, 60));
            i
        })
        .collect();
    got.sort();
    assert_eq!(got, (0..13).collect::<Vec<_>>());
}
