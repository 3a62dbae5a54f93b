#[cfg(not(loom))]
use std::sync::{Condvar, Mutex};

#[cfg(loom)]
use loom::sync::{Condvar, Mutex};

use crate::{
    error::JobCacheError,
    metajob::Metajob,
    store::SortedStore,
    threshold::Threshold,
    waiters::WaiterRegistry,
};

/// Everything protected by the cache's single mutex.
///
/// Keeping `store`, `waiters` and `stopping` behind one lock (rather than three) is what makes
/// `push`'s admission/eviction/handoff sequence and `shift`'s check-then-park sequence atomic
/// without any extra coordination.
struct Inner {
    store: SortedStore,
    waiters: WaiterRegistry,
    stopping: bool,
}

/// A bounded, priority-ordered job cache shared between a producer (something that polls durable
/// storage for ready work) and a pool of worker threads.
///
/// `JobCache` owns its contents outright: jobs handed back from [`push`](JobCache::push) (as
/// evictions) or [`clear`](JobCache::clear) (as a drain) transfer ownership to the caller, and
/// jobs handed out by [`shift`](JobCache::shift) transfer ownership to the consumer that receives
/// them. The cache performs no I/O and reads no clock; `run_at` timestamps are supplied by the
/// caller when it builds each [`Metajob`].
///
/// Cloning a `JobCache` handle is not supported — wrap it in an `Arc` to share it across producer
/// and worker threads.
pub struct JobCache {
    maximum_size: usize,
    minimum_size: usize,
    configured_priorities: Vec<Threshold>,
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl std::fmt::Debug for JobCache {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("JobCache")
            .field("maximum_size", &self.maximum_size)
            .field("minimum_size", &self.minimum_size)
            .field("size", &self.size())
            .field("stopping", &self.stopping())
            .finish()
    }
}

impl JobCache {
    /// Creates a new, running `JobCache`.
    ///
    /// `priorities` is informational only: it labels the threshold values the caller expects
    /// consumers to park on, which lets an implementation pre-allocate waiter slots. It never
    /// restricts which thresholds a later [`shift`](JobCache::shift) call may actually pass.
    ///
    /// # Errors
    ///
    /// Returns [`JobCacheError::MaximumSizeNotPositive`] if `maximum_size` is zero, or
    /// [`JobCacheError::MinimumExceedsMaximum`] if `minimum_size` exceeds `maximum_size`.
    pub fn new(
        maximum_size: usize,
        minimum_size: usize,
        priorities: impl IntoIterator<Item = Threshold>,
    ) -> Result<Self, JobCacheError> {
        if maximum_size == 0 {
            return Err(JobCacheError::MaximumSizeNotPositive);
        }
        if minimum_size > maximum_size {
            return Err(JobCacheError::MinimumExceedsMaximum {
                minimum: minimum_size,
                maximum: maximum_size,
            });
        }

        let configured_priorities: Vec<Threshold> = priorities.into_iter().collect();
        tracing::debug!(
            maximum_size,
            minimum_size,
            priority_slots = configured_priorities.len(),
            "constructing JobCache"
        );

        Ok(JobCache {
            maximum_size,
            minimum_size,
            configured_priorities,
            inner: Mutex::new(Inner {
                store: SortedStore::new(),
                waiters: WaiterRegistry::new(),
                stopping: false,
            }),
            condvar: Condvar::new(),
        })
    }

    /// The threshold labels this cache was configured with. Informational only — see
    /// [`new`](JobCache::new).
    pub fn priorities(&self) -> &[Threshold] {
        &self.configured_priorities
    }

    /// Merges `jobs` into the cache and reconciles against capacity and parked waiters.
    ///
    /// Returns the jobs that did not make it in: if the cache is [`stopping`](JobCache::stopping),
    /// that is every input job, sorted ascending; otherwise it is whichever jobs fell out of the
    /// top `maximum_size` after insertion, also sorted ascending (possibly empty).
    ///
    /// Jobs that fit are immediately handed to the most selective parked waiter willing to take
    /// them (see the design notes on waiter selection) before `push` returns.
    pub fn push(&self, jobs: impl IntoIterator<Item = Metajob>) -> Vec<Metajob> {
        let mut inner = self.inner.lock_cache();

        if inner.stopping {
            let mut rejected: Vec<Metajob> = jobs.into_iter().collect();
            rejected.sort();
            tracing::warn!(count = rejected.len(), "push rejected, cache is stopping");
            return rejected;
        }

        let mut pushed_count = 0usize;
        for job in jobs {
            inner.store.insert(job);
            pushed_count += 1;
        }

        let mut evicted = Vec::new();
        while inner.store.len() > self.maximum_size {
            if let Some(worst) = inner.store.pop_max() {
                evicted.push(worst);
            } else {
                break;
            }
        }
        evicted.sort();

        let mut handed_out = 0usize;
        while let Some(candidate) = inner.store.pop_min() {
            match inner.waiters.offer(candidate) {
                Ok(()) => handed_out += 1,
                Err(job) => {
                    inner.store.insert(job);
                    break;
                }
            }
        }

        drop(inner);
        self.condvar.notify_all();

        tracing::debug!(
            pushed = pushed_count,
            evicted = evicted.len(),
            handed_out,
            "push complete"
        );
        evicted
    }

    /// Previews the result of calling [`push`](JobCache::push) with the same jobs right now,
    /// without mutating anything.
    ///
    /// Returns the subset of `jobs` that would be retained, sorted ascending. If the cache is
    /// stopping, returns every input job sorted ascending instead — matching `push`'s stop-time
    /// return shape even though `push` itself would reject them all (see the design notes; the
    /// producer relies on this to keep treating a stopping cache as full rather than as having
    /// room).
    pub fn accept<'a>(&self, jobs: impl IntoIterator<Item = &'a Metajob>) -> Vec<Metajob> {
        let jobs: Vec<Metajob> = jobs.into_iter().cloned().collect();
        let inner = self.inner.lock_cache();

        if inner.stopping {
            let mut admitted = jobs;
            admitted.sort();
            return admitted;
        }

        let mut combined: Vec<Metajob> = inner.store.snapshot();
        combined.extend(jobs.iter().cloned());
        combined.sort();
        combined.truncate(self.maximum_size);

        let input_ids: std::collections::HashSet<i64> = jobs.iter().map(Metajob::id).collect();
        combined
            .into_iter()
            .filter(|job| input_ids.contains(&job.id()))
            .collect()
    }

    /// Blocks until a job satisfying `threshold` is available, or the cache stops.
    ///
    /// Returns `None` once [`stop`](JobCache::stop) has been called; callers should treat `None`
    /// as "exit the worker loop", not as an error.
    pub fn shift(&self, threshold: Threshold) -> Option<Metajob> {
        let mut inner = self.inner.lock_cache();

        if inner.stopping {
            return None;
        }

        if let Some(min) = inner.store.peek_min() {
            if threshold.admits(min.priority()) {
                return inner.store.pop_min();
            }
        }

        let id = inner.waiters.register(threshold);
        tracing::trace!(waiter = id, ?threshold, "shift parked");

        loop {
            inner = self.condvar.wait_cache(inner);

            if inner.stopping {
                inner.waiters.remove(id);
                tracing::trace!(waiter = id, "shift woke to stop");
                return None;
            }

            if let Some(job) = inner.waiters.take_delivery(id) {
                tracing::trace!(waiter = id, "shift woke with delivered job");
                return Some(job);
            }

            // Defense in depth: push's own handoff loop already exhausts every store entry a
            // registered waiter could take, so this should be a no-op in practice. Kept so a
            // spurious wakeup (or a future change to push) can't strand an eligible waiter.
            let directly_eligible = inner
                .store
                .peek_min()
                .map_or(false, |min| threshold.admits(min.priority()));
            if directly_eligible {
                inner.waiters.remove(id);
                return inner.store.pop_min();
            }
        }
    }

    /// Latches the cache into its terminal state. Idempotent — calling `stop` more than once has
    /// no additional effect.
    ///
    /// After `stop`, every currently parked and future [`shift`](JobCache::shift) call returns
    /// `None`, [`push`](JobCache::push) rejects everything it's given, and
    /// [`accept`](JobCache::accept) keeps reporting inputs as admissible (see its docs).
    /// [`clear`](JobCache::clear) continues to work.
    pub fn stop(&self) {
        let mut inner = self.inner.lock_cache();
        let was_already_stopping = inner.stopping;
        inner.stopping = true;
        let parked_waiters = inner.waiters.len();
        drop(inner);
        self.condvar.notify_all();
        if !was_already_stopping {
            tracing::info!(parked_waiters, "JobCache stopping");
        }
    }

    /// The number of jobs currently held.
    pub fn size(&self) -> usize {
        self.inner.lock_cache().store.len()
    }

    /// How many more jobs the cache can usefully absorb right now: free capacity, plus one for
    /// every parked consumer willing to accept any priority (they'll take a job the instant it
    /// arrives, so the producer should fetch for them too).
    pub fn space(&self) -> usize {
        let inner = self.inner.lock_cache();
        let free = self.maximum_size.saturating_sub(inner.store.len());
        free + inner.waiters.parked_any_count()
    }

    /// Whether the cache holds fewer jobs than `minimum_size`, i.e. whether the producer should
    /// top it up.
    pub fn jobs_needed(&self) -> bool {
        self.inner.lock_cache().store.len() < self.minimum_size
    }

    /// Whether [`stop`](JobCache::stop) has been called.
    pub fn stopping(&self) -> bool {
        self.inner.lock_cache().stopping
    }

    /// A freshly allocated, ascending snapshot of the cache's contents. Independent of the cache
    /// afterward, and of any snapshot returned by a previous call.
    pub fn to_vec(&self) -> Vec<Metajob> {
        self.inner.lock_cache().store.snapshot()
    }

    /// Removes and returns every job currently held, ascending. Works even after
    /// [`stop`](JobCache::stop).
    pub fn clear(&self) -> Vec<Metajob> {
        self.inner.lock_cache().store.drain_sorted()
    }
}

#[cfg(not(loom))]
type Guard<'a, T> = std::sync::MutexGuard<'a, T>;
#[cfg(loom)]
type Guard<'a, T> = loom::sync::MutexGuard<'a, T>;

/// Tiny `lock()`/`wait()` shims so the rest of this module doesn't need a `cfg(loom)` branch at
/// every call site: `std::sync::Mutex`/`Condvar` return a `LockResult`/`.unwrap()`-worthy guard,
/// `loom`'s equivalents don't poison and return the guard directly.
trait LockExt<T> {
    fn lock_cache(&self) -> Guard<'_, T>;
}

#[cfg(not(loom))]
impl<T> LockExt<T> for Mutex<T> {
    fn lock_cache(&self) -> Guard<'_, T> {
        self.lock().expect(
            "JobCache mutex poisoned: a prior holder panicked while mutating store/waiters",
        )
    }
}

#[cfg(loom)]
impl<T> LockExt<T> for Mutex<T> {
    fn lock_cache(&self) -> Guard<'_, T> {
        self.lock().unwrap()
    }
}

trait CondvarExt<T> {
    fn wait_cache<'a>(&self, guard: Guard<'a, T>) -> Guard<'a, T>;
}

#[cfg(not(loom))]
impl<T> CondvarExt<T> for Condvar {
    fn wait_cache<'a>(&self, guard: Guard<'a, T>) -> Guard<'a, T> {
        self.wait(guard)
            .expect("JobCache mutex poisoned while a waiter was parked")
    }
}

#[cfg(loom)]
impl<T> CondvarExt<T> for Condvar {
    fn wait_cache<'a>(&self, guard: Guard<'a, T>) -> Guard<'a, T> {
        self.wait(guard).unwrap()
    }
}
