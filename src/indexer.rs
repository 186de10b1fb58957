use crate::{
    load_resampled, AudioSource, ChunkEntry, Error, LabelMap, SourceItem, WindowConfig,
    WindowGeometry,
};

/// Computes the window start offsets for a source of `len` samples.
///
/// Offsets step by the stride while the whole window fits. If those windows
/// stop short of the last sample, one more offset is added whose window runs
/// past the end; it is flagged `true` so it gets zero-padded. A tail that is
/// already covered by a fitting window never gets a second, redundant entry.
pub fn window_offsets(len: usize, geometry: &WindowGeometry) -> Vec<(usize, bool)> {
    let (window_samples, stride) = (geometry.window_samples(), geometry.stride());
    if len == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(len.saturating_sub(window_samples) / stride + 2);
    let mut offset = 0;
    while offset + window_samples <= len {
        out.push((offset, false));
        offset += stride;
    }

    let covered = out
        .last()
        .map(|(last, _)| last + window_samples)
        .unwrap_or(0);
    if covered < len {
        // `offset` is the first start that didn't fit; it is always < len here
        // because stride <= window_samples.
        out.push((offset, true));
    }
    out
}

/// Builds the flat window index over `items`, preserving their order.
///
/// Every file is decoded once (and resampled to the configured rate) to learn
/// its length. Files that decode to no samples contribute no entries.
pub fn build_index<S: AudioSource + ?Sized>(
    items: &[SourceItem],
    window: &WindowConfig,
    labels: &LabelMap,
    source: &S,
) -> Result<Vec<ChunkEntry>, Error> {
    let geometry = window.geometry()?;
    let mut index = Vec::new();
    let mut skipped = 0usize;

    for (n, item) in items.iter().enumerate() {
        let label = labels.index_of(&item.label)?;
        let len = load_resampled(source, &item.path, window.sample_rate)?.len();
        if len == 0 {
            log::warn!("{}: no audio samples, skipping", item.path.display());
            skipped += 1;
            continue;
        }

        let offsets = window_offsets(len, &geometry);
        log::debug!(
            "[{}/{}] {}: {} samples -> {} windows",
            n + 1,
            items.len(),
            item.path.display(),
            len,
            offsets.len()
        );
        index.extend(offsets.into_iter().map(|(start_offset, padded)| ChunkEntry {
            source_path: item.path.clone(),
            label,
            start_offset,
            padded,
        }));
    }

    log::info!(
        "indexed {} windows from {} files ({} empty)",
        index.len(),
        items.len() - skipped,
        skipped
    );
    Ok(index)
}
