//! Parallel map-reduce over work items.
//!
//! Workers pull items from a shared queue, convert each one into a private
//! accumulator built by a caller factory, and fold that accumulator into
//! the shared result under a lock. The merge must be order independent;
//! the result is then identical for any worker count.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use mc_conv_world::Pos2i;
use tracing::{debug, info};

use crate::error::{ConvertError, ErrorKind, Result};
use crate::here;
use crate::options::Progress;

/// Shared state visible to every worker of one run.
pub struct Parallel<'a> {
    concurrency: usize,
    cancelled: AtomicBool,
    done: AtomicU64,
    total: u64,
    progress: &'a dyn Progress,
}

impl<'a> Parallel<'a> {
    pub fn new(concurrency: usize, total: u64, progress: &'a dyn Progress) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancelled: AtomicBool::new(false),
            done: AtomicU64::new(0),
            total,
            progress,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Chunks actually converted so far.
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Acquire)
    }

    /// Count one converted chunk and forward progress. A `false` from the
    /// progress sink cancels the run.
    pub fn chunk_done(&self) {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.progress.report(done, self.total) {
            self.cancel();
        }
    }

    fn pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("mc-conv-worker-{i}"))
            .build()
            .map_err(|e| ConvertError::new(ErrorKind::Invalid(format!("worker pool: {e}")), here!()))
    }

    /// Run `work` over every item. Each item gets a fresh accumulator from
    /// `make`, folded into `result` with `merge` once the item finishes.
    ///
    /// The first error stops all workers and is returned. Cancellation
    /// stops claiming new items and reports [`ErrorKind::Cancelled`].
    pub fn reduce<W, C, M, F, G>(&self, items: Vec<W>, result: &mut C, make: M, work: F, merge: G) -> Result<()>
    where
        W: Send,
        C: Send,
        M: Fn() -> C + Sync,
        F: Fn(W, &mut C) -> Result<()> + Sync,
        G: Fn(C, &mut C) + Sync,
    {
        let queue = Mutex::new(items.into_iter().collect::<VecDeque<_>>());
        let shared = Mutex::new(result);
        let failure: Mutex<Option<ConvertError>> = Mutex::new(None);
        let workers = self.concurrency.min(lock(&queue)?.len()).max(1);

        let worker = || {
            loop {
                if self.is_cancelled() {
                    return;
                }
                let item = match lock(&queue) {
                    Ok(mut q) => q.pop_front(),
                    Err(_) => None,
                };
                let Some(item) = item else {
                    return;
                };
                let mut child = make();
                let outcome = work(item, &mut child);
                if let Ok(mut parent) = lock(&shared) {
                    merge(child, &mut **parent);
                }
                if let Err(e) = outcome {
                    self.fail(&failure, e);
                    return;
                }
            }
        };

        if workers == 1 {
            worker();
        } else {
            let pool = self.pool()?;
            debug!(workers, "starting worker pool");
            pool.scope(|s| {
                for _ in 0..workers {
                    s.spawn(|_| worker());
                }
            });
        }
        self.finish(failure)
    }

    /// Chunk-granular variant: a chunk is claimed only while no other
    /// worker holds a chunk within Chebyshev distance 1 of it, so two
    /// workers never read or write overlapping 3×3 windows.
    pub fn reduce_chunks<C, M, F, G>(&self, chunks: Vec<Pos2i>, result: &mut C, make: M, work: F, merge: G) -> Result<()>
    where
        C: Send,
        M: Fn() -> C + Sync,
        F: Fn(Pos2i, &mut C) -> Result<()> + Sync,
        G: Fn(C, &mut C) + Sync,
    {
        let tracker = Mutex::new(BusyTracker::new(chunks));
        let shared = Mutex::new(result);
        let failure: Mutex<Option<ConvertError>> = Mutex::new(None);

        let worker = || {
            loop {
                if self.is_cancelled() {
                    return;
                }
                let claim = match lock(&tracker) {
                    Ok(mut t) => t.claim(),
                    Err(_) => Claim::Finished,
                };
                let chunk = match claim {
                    Claim::Finished => return,
                    Claim::Wait => {
                        std::thread::sleep(Duration::from_millis(1));
                        continue;
                    }
                    Claim::Chunk(c) => c,
                };
                let mut child = make();
                let outcome = work(chunk, &mut child);
                if let Ok(mut parent) = lock(&shared) {
                    merge(child, &mut **parent);
                }
                if let Ok(mut t) = lock(&tracker) {
                    t.release(chunk);
                }
                if let Err(e) = outcome {
                    self.fail(&failure, e);
                    return;
                }
            }
        };

        if self.concurrency == 1 {
            worker();
        } else {
            let pool = self.pool()?;
            pool.scope(|s| {
                for _ in 0..self.concurrency {
                    s.spawn(|_| worker());
                }
            });
        }
        self.finish(failure)
    }

    fn fail(&self, failure: &Mutex<Option<ConvertError>>, e: ConvertError) {
        self.cancel();
        if let Ok(mut slot) = failure.lock() {
            slot.get_or_insert(e);
        }
    }

    fn finish(&self, failure: Mutex<Option<ConvertError>>) -> Result<()> {
        let failure = failure
            .into_inner()
            .map_err(|_| ConvertError::invalid("worker panicked", here!()))?;
        if let Some(e) = failure {
            return Err(e.push(here!()));
        }
        if self.is_cancelled() {
            info!(done = self.done(), total = self.total, "conversion cancelled");
            return Err(ConvertError::cancelled(here!()));
        }
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    m.lock().map_err(|_| ConvertError::invalid("poisoned work queue", here!()))
}

// ─── Busy tracker ───────────────────────────────────────────────────────────

enum Claim {
    Chunk(Pos2i),
    Wait,
    Finished,
}

/// Pending chunks plus the set currently held by workers.
struct BusyTracker {
    pending: VecDeque<Pos2i>,
    busy: HashSet<Pos2i>,
}

impl BusyTracker {
    fn new(chunks: Vec<Pos2i>) -> Self {
        Self {
            pending: chunks.into(),
            busy: HashSet::new(),
        }
    }

    fn conflicts(&self, chunk: Pos2i) -> bool {
        (-1..=1).any(|dz| (-1..=1).any(|dx| self.busy.contains(&(chunk + Pos2i::new(dx, dz)))))
    }

    fn claim(&mut self) -> Claim {
        if self.pending.is_empty() {
            return Claim::Finished;
        }
        let Some(i) = self.pending.iter().position(|&c| !self.conflicts(c)) else {
            return Claim::Wait;
        };
        match self.pending.remove(i) {
            Some(chunk) => {
                self.busy.insert(chunk);
                Claim::Chunk(chunk)
            }
            None => Claim::Wait,
        }
    }

    fn release(&mut self, chunk: Pos2i) {
        self.busy.remove(&chunk);
    }
}
