//! An in-process, bounded, priority-ordered job cache.
//!
//! `jobcache` sits between a producer — something that polls durable storage (a SQL table,
//! typically) for ready-to-run jobs — and a pool of worker threads that execute them. It buffers
//! jobs up to a fixed capacity, keeps them in `(priority, run_at, id)` order, lets workers block
//! for the next job they're willing to take, and drains cleanly on shutdown.
//!
//! The cache never performs I/O. It knows nothing about how a [`Metajob`] got its sort key, nor
//! how a worker executes one once handed one; both of those are the caller's concern.
//!
//! # Examples
//!
//! Constructing a cache and running a push/shift round trip:
//!
//! ```
//! use jobcache::{JobCache, Metajob, Threshold};
//! use std::time::SystemTime;
//!
//! let cache = JobCache::new(8, 0, vec![Threshold::Any]).unwrap();
//! let job = Metajob::new(5, SystemTime::now(), 1);
//! let evicted = cache.push(vec![job.clone()]);
//! assert!(evicted.is_empty());
//! assert_eq!(cache.shift(Threshold::Any), Some(job));
//! ```
//!
//! Workers loop on [`JobCache::shift`] until it returns `None`, which only happens once
//! [`JobCache::stop`] has been called:
//!
//! ```
//! use jobcache::{JobCache, Threshold};
//!
//! let cache = JobCache::new(4, 0, Vec::new()).unwrap();
//! cache.stop();
//! assert_eq!(cache.shift(Threshold::Any), None);
//! ```

#![warn(missing_debug_implementations)]
#![warn(unused_lifetimes)]
#![cfg_attr(not(test), warn(unused_results))]
#![deny(rust_2018_idioms)]

mod cache;
mod error;
mod metajob;
mod store;
mod threshold;
mod waiters;

pub use crate::{
    cache::JobCache,
    error::JobCacheError,
    metajob::Metajob,
    threshold::Threshold,
};
