use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use circular_buffer::CircularBuffer;

use crate::{AudioSource, Error, Waveform};

/// How many decoded files a [`CachedSource`] keeps around.
pub const DECODE_CACHE_SLOTS: usize = 4;

/// CachedSource remembers the most recently decoded files of an inner source.
///
/// Consecutive windows of one file usually get requested back to back, so a
/// handful of slots avoids most re-decodes. Waveforms are cached at their
/// native rate exactly as the inner source returned them; a miss just
/// decodes again, so eviction never changes what callers see.
///
/// A hit still hands back an owned copy of the whole waveform, so it saves
/// the decode but not the allocation.
pub struct CachedSource<S> {
    inner: S,
    slots: Mutex<CircularBuffer<DECODE_CACHE_SLOTS, (PathBuf, Arc<Waveform>)>>,
}

impl<S: AudioSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            slots: Mutex::new(CircularBuffer::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lookup(&self, path: &Path) -> Option<Arc<Waveform>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, w)| w.clone())
    }
}

impl<S: AudioSource> AudioSource for CachedSource<S> {
    fn decode(&self, path: &Path) -> Result<Waveform, Error> {
        if let Some(hit) = self.lookup(path) {
            log::trace!("decode cache hit for {}", path.display());
            return Ok((*hit).clone());
        }

        // Decode outside the lock so concurrent misses on different files
        // don't serialise behind each other.
        let wave = Arc::new(self.inner.decode(path)?);
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if !slots.iter().any(|(p, _)| p == path) {
            slots.push_back((path.to_path_buf(), wave.clone()));
        }
        Ok((*wave).clone())
    }
}
