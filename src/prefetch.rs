use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use crate::{AudioSource, ChunkDataset, Error, FeatureTransform, WindowSample};

/// Prefetcher materializes dataset windows on a pool of worker threads.
///
/// Each requested index is delivered exactly once, paired with its result,
/// in whatever order the workers finish. Iteration ends after the last one.
pub struct Prefetcher {
    recv: Option<Receiver<(usize, Result<WindowSample, Error>)>>,
    shutdown: Arc<AtomicBool>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl Prefetcher {
    pub fn start<S, T>(
        dataset: Arc<ChunkDataset<S, T>>,
        order: Vec<usize>,
        workers: usize,
    ) -> Result<Self, Error>
    where
        S: AudioSource + 'static,
        T: FeatureTransform + 'static,
    {
        let workers = workers.max(1);
        let (send, recv) = sync_channel(workers * 2);
        let shutdown = Arc::new(AtomicBool::new(false));
        let order: Arc<[usize]> = order.into();
        let cursor = Arc::new(AtomicUsize::new(0));

        let mut threads = Vec::with_capacity(workers);
        for n in 0..workers {
            let send = send.clone();
            let shutdown2 = shutdown.clone();
            let dataset = dataset.clone();
            let order = order.clone();
            let cursor = cursor.clone();
            let thread = thread::Builder::new()
                .name(format!("prefetch-{n}"))
                .spawn(move || {
                    Prefetcher::mainloop(send, shutdown2, dataset, order, cursor);
                })?;
            threads.push(thread);
        }

        Ok(Self {
            recv: Some(recv),
            shutdown,
            threads,
        })
    }

    fn mainloop<S: AudioSource, T: FeatureTransform>(
        tx: SyncSender<(usize, Result<WindowSample, Error>)>,
        shutdown: Arc<AtomicBool>,
        dataset: Arc<ChunkDataset<S, T>>,
        order: Arc<[usize]>,
        cursor: Arc<AtomicUsize>,
    ) {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return;
            }
            let Some(&index) = order.get(cursor.fetch_add(1, Ordering::SeqCst)) else {
                return;
            };

            let sample = dataset.get(index);
            if shutdown.load(Ordering::SeqCst) {
                return;
            }

            if let Err(e) = tx.send((index, sample)) {
                log::debug!("failed send of window {}, prefetch thread shutting down", e.0 .0);
                return;
            }
        }
    }
}

impl Iterator for Prefetcher {
    type Item = (usize, Result<WindowSample, Error>);

    fn next(&mut self) -> Option<Self::Item> {
        // Ends once every worker has finished and dropped its sender.
        self.recv.as_ref()?.recv().ok()
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Dropping the receiver unblocks any worker parked on a full channel.
        self.recv.take();
        for hnd in self.threads.drain(..) {
            hnd.join().ok();
        }
    }
}
