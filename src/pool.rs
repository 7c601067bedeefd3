//! Worker pool sizing shared by the resolver and the download manager.

use std::num::NonZeroUsize;

/// Smallest pool size, so small machines still overlap network waits.
pub const MIN_WORKERS: usize = 4;

/// Returns the default worker count: twice the available parallelism, at
/// least [`MIN_WORKERS`].
#[must_use]
pub fn default_worker_count() -> usize {
    let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    clamp_workers(parallelism.saturating_mul(2))
}

/// Applies the pool floor to a requested worker count.
#[must_use]
pub fn clamp_workers(requested: usize) -> usize {
    requested.max(MIN_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_count_respects_floor() {
        assert!(default_worker_count() >= MIN_WORKERS);
    }

    #[test]
    fn test_clamp_workers() {
        assert_eq!(clamp_workers(0), MIN_WORKERS);
        assert_eq!(clamp_workers(1), MIN_WORKERS);
        assert_eq!(clamp_workers(32), 32);
    }
}
