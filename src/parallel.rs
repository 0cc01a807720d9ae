//! Fork-join evaluation over fixed index partitions.
//!
//! Each worker owns one contiguous slice of the outer index range and
//! produces exactly one result slot. Slots come back in partition order and
//! are reduced sequentially, so the outcome does not depend on scheduling.

use log::warn;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Split `0..len` into at most `workers` contiguous, non-empty ranges whose
/// sizes differ by at most one.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let parts = workers.max(1).min(len);
    if parts == 0 {
        return Vec::new();
    }

    let base = len / parts;
    let extra = len % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;

    for p in 0..parts {
        let size = base + usize::from(p < extra);
        ranges.push(start..start + size);
        start += size;
    }

    ranges
}

/// Number of hardware threads, falling back to one.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// A fixed-size worker pool running partitioned map steps.
#[derive(Debug)]
pub struct ParallelHarness {
    workers: usize,
    pool: Option<ThreadPool>,
}

impl ParallelHarness {
    /// Create a harness with `workers` threads (hardware parallelism if `None`).
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(available_workers).max(1);

        let pool = if workers > 1 {
            match ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    warn!("could not build a {}-thread pool, using the global one: {}", workers, err);
                    None
                }
            }
        } else {
            None
        };

        ParallelHarness { workers, pool }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` once per partition of `0..len` and return the results in partition order.
    pub fn map_partitions<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync,
    {
        let ranges = partition(len, self.workers);

        if ranges.len() <= 1 {
            return ranges.into_iter().map(f).collect();
        }

        let run = || ranges.into_par_iter().map(&f).collect::<Vec<T>>();
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

/// Pick the slot with the highest key; the earliest slot wins ties.
pub fn reduce_max_by<T, K>(slots: impl IntoIterator<Item = Option<T>>, key: K) -> Option<T>
where
    K: Fn(&T) -> f64,
{
    let mut best: Option<T> = None;
    for item in slots.into_iter().flatten() {
        let better = match &best {
            Some(current) => key(&item) > key(current),
            None => true,
        };
        if better {
            best = Some(item);
        }
    }
    best
}

/// Pick the slot with the lowest key; the earliest slot wins ties.
pub fn reduce_min_by<T, K>(slots: impl IntoIterator<Item = Option<T>>, key: K) -> Option<T>
where
    K: Fn(&T) -> f64,
{
    reduce_max_by(slots, |item| -key(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_range_without_gaps() {
        let ranges = partition(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn partition_never_yields_empty_ranges() {
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn reduction_keeps_first_of_equal_keys() {
        let slots = vec![Some((0, 1.0)), None, Some((2, 3.0)), Some((3, 3.0))];
        assert_eq!(reduce_max_by(slots.clone(), |s| s.1), Some((2, 3.0)));
        assert_eq!(reduce_min_by(slots, |s| s.1), Some((0, 1.0)));
    }

    #[test]
    fn results_come_back_in_partition_order() {
        let harness = ParallelHarness::new(Some(4));
        let sums = harness.map_partitions(100, |range| range.start);
        assert_eq!(sums, vec![0, 25, 50, 75]);
    }
}
