//! Task-parallel executor for a claimed batch. A fixed-size thread pool
//! processes records concurrently with no required ordering between
//! items; results are collected back in the original order so callers can
//! still correlate a result with the record it came from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

/// A cheap, clonable cooperative-cancellation flag. Interrupts the
/// concurrent record-processing pool; siblings already running run to
/// completion or cooperative-check cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A bounded worker pool for processing one batch concurrently.
pub struct TaskPool {
    pool: ThreadPool,
}

impl TaskPool {
    pub fn new(workers: usize) -> Self {
        let pool = ThreadPoolBuilder::new().num_threads(workers.max(1))
                                           .thread_name(|i| format!("wq-worker-{i}"))
                                           .build()
                                           .expect("failed to build task pool");
        Self { pool }
    }

    /// Runs `f` over every item, skipping items not yet started once
    /// `cancel` is observed set. Order of the returned vector matches
    /// `items`; a skipped item yields `None`.
    pub fn map_collect<T, R, F>(&self, items: Vec<T>, cancel: &CancelToken, f: F) -> Vec<Option<R>>
        where T: Send,
              R: Send,
              F: Fn(T) -> R + Sync
    {
        use rayon::prelude::*;
        self.pool.install(|| {
            items.into_par_iter()
                 .map(|item| if cancel.is_cancelled() { None } else { Some(f(item)) })
                 .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_every_item_when_not_cancelled() {
        let pool = TaskPool::new(4);
        let cancel = CancelToken::new();
        let items: Vec<i32> = (0..20).collect();
        let results = pool.map_collect(items, &cancel, |i| i * 2);
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(Option::is_some));
    }

    #[test]
    fn cancel_token_is_observed_before_processing_starts() {
        let pool = TaskPool::new(2);
        let cancel = CancelToken::new();
        cancel.cancel();
        let items: Vec<i32> = (0..5).collect();
        let results = pool.map_collect(items, &cancel, |i| i);
        assert!(results.iter().all(Option::is_none));
    }
}
