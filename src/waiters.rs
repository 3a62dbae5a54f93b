use crate::{metajob::Metajob, threshold::Threshold};

/// A unique handle identifying one parked [`shift`](crate::JobCache::shift) call.
///
/// Waiters don't get their own mutex or condvar — every parked thread blocks on the single
/// condvar `JobCache` keeps beside its lock, and distinguishes "was this handoff meant for me"
/// by comparing this id against the slot `JobCache::push` wrote into.
pub(crate) type WaiterId = u64;

/// One consumer parked inside [`shift`](crate::JobCache::shift), waiting for a job whose priority
/// satisfies `threshold`.
#[derive(Debug)]
pub(crate) struct Waiter {
    id: WaiterId,
    threshold: Threshold,
    delivered: Option<Metajob>,
}

/// The set of consumers currently parked in `shift`, ordered by nothing in particular — lookups
/// are by id, and the one traversal that matters (picking which waiter a freshly pushed job goes
/// to) scans for the most selective *eligible* waiter rather than relying on storage order.
#[derive(Debug, Default)]
pub(crate) struct WaiterRegistry {
    waiters: Vec<Waiter>,
    next_id: WaiterId,
}

impl WaiterRegistry {
    pub(crate) fn new() -> Self {
        WaiterRegistry {
            waiters: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a new parked waiter and returns the id it should watch for.
    pub(crate) fn register(&mut self, threshold: Threshold) -> WaiterId {
        let id = self.next_id;
        self.next_id += 1;
        self.waiters.push(Waiter {
            id,
            threshold,
            delivered: None,
        });
        id
    }

    /// Removes a waiter unconditionally (used when a parked `shift` call wakes up to `stopping`
    /// and gives up without ever being handed a job).
    pub(crate) fn remove(&mut self, id: WaiterId) {
        self.waiters.retain(|w| w.id != id);
    }

    /// If `id` has been handed a job, removes its entry and returns the job.
    pub(crate) fn take_delivery(&mut self, id: WaiterId) -> Option<Metajob> {
        let position = self.waiters.iter().position(|w| w.id == id)?;
        if self.waiters[position].delivered.is_some() {
            Some(self.waiters.remove(position).delivered.unwrap())
        } else {
            None
        }
    }

    /// Among waiters not yet handed a job, finds the one whose threshold is the most selective
    /// (numerically highest, `Any` last) while still admitting `priority` — the policy from the
    /// design notes: a job should go to the pickiest worker still willing to take it, not the
    /// first worker that happens to be willing.
    fn most_selective_eligible(&mut self, priority: i64) -> Option<&mut Waiter> {
        self.waiters
            .iter_mut()
            .filter(|w| w.delivered.is_none() && w.threshold.admits(priority))
            .max_by_key(|w| w.threshold)
    }

    /// Hands `job` to the most selective waiter still willing to take it, if any. Returns the job
    /// back if no registered waiter can take it.
    pub(crate) fn offer(&mut self, job: Metajob) -> Result<(), Metajob> {
        match self.most_selective_eligible(job.priority()) {
            Some(waiter) => {
                waiter.delivered = Some(job);
                Ok(())
            }
            None => Err(job),
        }
    }

    /// The number of currently parked waiters whose threshold is `Threshold::Any` and who have
    /// not yet been handed a job — used by `JobCache::space` so a polling producer knows to
    /// over-fetch for idle any-priority workers.
    pub(crate) fn parked_any_count(&self) -> usize {
        self.waiters
            .iter()
            .filter(|w| w.delivered.is_none() && w.threshold == Threshold::Any)
            .count()
    }

    /// The total number of waiters currently registered, delivered or not — used by
    /// `JobCache::stop` to report how many consumers were parked at the moment of shutdown.
    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn job(priority: i64, id: i64) -> Metajob {
        Metajob::new(priority, SystemTime::UNIX_EPOCH, id)
    }

    #[test]
    fn offer_picks_most_selective_eligible_waiter() {
        let mut registry = WaiterRegistry::new();
        let low = registry.register(Threshold::Bounded(10));
        let mid = registry.register(Threshold::Bounded(30));
        let high = registry.register(Threshold::Bounded(50));

        registry.offer(job(25, 1)).unwrap();

        assert_eq!(registry.take_delivery(high), Some(job(25, 1)));
        assert_eq!(registry.take_delivery(mid), None);
        assert_eq!(registry.take_delivery(low), None);
    }

    #[test]
    fn offer_prefers_any_only_when_nothing_more_selective_qualifies() {
        let mut registry = WaiterRegistry::new();
        let selective = registry.register(Threshold::Bounded(10));
        let any = registry.register(Threshold::Any);

        registry.offer(job(50, 1)).unwrap();

        assert_eq!(registry.take_delivery(any), Some(job(50, 1)));
        assert_eq!(registry.take_delivery(selective), None);
    }

    #[test]
    fn offer_returns_job_when_no_waiter_qualifies() {
        let mut registry = WaiterRegistry::new();
        registry.register(Threshold::Bounded(5));

        assert_eq!(registry.offer(job(10, 1)), Err(job(10, 1)));
    }

    #[test]
    fn parked_any_count_ignores_bounded_and_delivered_waiters() {
        let mut registry = WaiterRegistry::new();
        registry.register(Threshold::Bounded(5));
        let any_one = registry.register(Threshold::Any);
        registry.register(Threshold::Any);

        assert_eq!(registry.parked_any_count(), 2);

        registry.offer(job(1, 1)).unwrap();
        assert_eq!(registry.parked_any_count(), 1);
        assert_eq!(registry.take_delivery(any_one), Some(job(1, 1)));
    }

    #[test]
    fn len_counts_every_registered_waiter_regardless_of_delivery() {
        let mut registry = WaiterRegistry::new();
        assert_eq!(registry.len(), 0);

        registry.register(Threshold::Bounded(5));
        let any = registry.register(Threshold::Any);
        assert_eq!(registry.len(), 2);

        registry.offer(job(1, 1)).unwrap();
        assert_eq!(registry.len(), 2);

        registry.take_delivery(any);
        assert_eq!(registry.len(), 1);
    }
}
