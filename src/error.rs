use core::fmt::{self, Debug, Formatter};

/// An error returned by [`JobCache::new`](crate::JobCache::new) when the requested configuration
/// cannot be satisfied.
///
/// There is no error path for any other `JobCache` operation — `push`, `accept`, `shift` and the
/// observers are all total once construction has succeeded.
#[derive(thiserror::Error, Clone, PartialEq, Eq)]
pub enum JobCacheError {
    /// `maximum_size` was zero.
    ///
    /// The source system accepts a signed integer and rejects `maximum_size <= 0`; since this
    /// crate's `maximum_size` is unsigned, zero is the only value that can trigger this, but the
    /// variant name and message are kept faithful to the original bound.
    #[error("maximum_size for a JobCache must be greater than zero!")]
    MaximumSizeNotPositive,

    /// `minimum_size` was negative.
    ///
    /// Unreachable through [`JobCache::new`](crate::JobCache::new): `minimum_size` is unsigned in
    /// this crate, so it can never be negative. Kept for interface parity with the source system,
    /// whose `minimum_size` is a signed integer and can fail this check independently of the
    /// maximum/minimum relationship below.
    #[error("minimum_size for a JobCache must be at least zero!")]
    MinimumSizeNegative,

    /// `minimum_size` was greater than `maximum_size`.
    #[error(
        "minimum queue size ({minimum}) is greater than the maximum queue size ({maximum})!"
    )]
    MinimumExceedsMaximum {
        /// The rejected `minimum_size`.
        minimum: usize,
        /// The `maximum_size` it was compared against.
        maximum: usize,
    },
}

impl Debug for JobCacheError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        // thiserror's Display already renders the exact wording callers need; Debug just
        // reuses it rather than dumping enum internals twice.
        write!(formatter, "JobCacheError({})", self)
    }
}
