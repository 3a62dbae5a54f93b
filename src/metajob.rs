use std::time::SystemTime;

/// A handle over a job record living in durable storage.
///
/// `Metajob` carries exactly the fields [`JobCache`](crate::JobCache) needs to order and admit
/// work: a `priority` (lower is more important), a `run_at` timestamp (earlier is more
/// important), and a unique `id` used only as a final tiebreak. Everything else about the
/// underlying job — its payload, queue name, retry count — is the caller's business; the cache
/// never looks past these three fields.
///
/// Two `Metajob`s are equal iff all three fields match, and they compare lexicographically on
/// `(priority, run_at, id)`. Field declaration order here doubles as the comparison order, so
/// keep it that way if this type ever grows more fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Metajob {
    priority: i64,
    run_at: SystemTime,
    id: i64,
}

impl Metajob {
    /// Creates a new `Metajob` from its sort key.
    pub fn new(priority: i64, run_at: SystemTime, id: i64) -> Self {
        Metajob {
            priority,
            run_at,
            id,
        }
    }

    /// Lower values are more important. Compared first.
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Earlier values are more important. Compared second, after `priority`.
    pub fn run_at(&self) -> SystemTime {
        self.run_at
    }

    /// A globally unique identifier, compared last as a tiebreak.
    pub fn id(&self) -> i64 {
        self.id
    }
}
