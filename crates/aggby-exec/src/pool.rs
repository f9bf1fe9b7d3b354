//! Fixed-size worker pool with bounded teardown.
//!
//! The pool is a rayon `ThreadPool`. Each worker decrements a shared live
//! counter from rayon's exit handler, so `shutdown` can wait for the workers
//! to actually leave instead of only signalling them.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};

use aggby_core::id::WorkerId;

use crate::error::ExecError;
use crate::metrics;

#[derive(Debug, Default)]
struct Liveness {
    live: Mutex<usize>,
    exited: Condvar,
}

impl Liveness {
    fn worker_exited(&self) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        *live = live.saturating_sub(1);
        self.exited.notify_all();
    }

    fn live(&self) -> usize {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
    liveness: Arc<Liveness>,
}

impl WorkerPool {
    /// Build a pool with exactly `threads` workers.
    pub fn new(threads: usize) -> Result<Self, ExecError> {
        if threads == 0 {
            return Err(ExecError::Config("worker pool needs at least one thread".into()));
        }
        let liveness = Arc::new(Liveness {
            live: Mutex::new(threads),
            exited: Condvar::new(),
        });
        let on_exit = Arc::clone(&liveness);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("aggby-worker-{i}"))
            .exit_handler(move |_| on_exit.worker_exited())
            .build()
            .map_err(|e| ExecError::PoolBuild(e.to_string()))?;
        metrics::record_pool("started", threads);
        Ok(Self {
            pool,
            threads,
            liveness,
        })
    }

    /// Size the pool to the machine's available hardware parallelism.
    pub fn with_available_parallelism() -> Result<Self, ExecError> {
        Self::new(num_cpus::get().max(1))
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Workers that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.liveness.live()
    }

    /// Run `op` inside the pool; rayon parallel iterators used within `op`
    /// execute on this pool's workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Identity of the calling worker, if the caller is one of this pool's threads.
    pub fn current_worker(&self) -> Option<WorkerId> {
        self.pool.current_thread_index().map(|i| WorkerId::new(i as u64))
    }

    /// Stop accepting work and wait up to `timeout` for every worker to exit.
    pub fn shutdown(self, timeout: Duration) -> Result<(), ExecError> {
        let WorkerPool {
            pool,
            threads,
            liveness,
        } = self;
        drop(pool);

        let live = liveness.live.lock().unwrap_or_else(PoisonError::into_inner);
        let (live, wait) = liveness
            .exited
            .wait_timeout_while(live, timeout, |live| *live > 0)
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() && *live > 0 {
            return Err(ExecError::ShutdownTimeout {
                live: *live,
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        metrics::record_pool("stopped", threads);
        Ok(())
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("live", &self.live_workers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn zero_threads_is_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(ExecError::Config(_))));
    }

    #[test]
    fn install_runs_on_pool_workers() {
        let pool = WorkerPool::new(2).unwrap();
        let worker = pool.install(|| pool.current_worker());
        assert!(worker.is_some());
        assert_eq!(pool.current_worker(), None);

        let total: u64 = pool.install(|| (1..=100u64).into_par_iter().sum());
        assert_eq!(total, 5050);
        pool.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn busy_worker_makes_shutdown_time_out() {
        let pool = WorkerPool::new(1).unwrap();
        pool.install(|| rayon::spawn(|| std::thread::sleep(Duration::from_millis(1_500))));
        let start = std::time::Instant::now();
        let err = pool.shutdown(Duration::from_millis(50)).unwrap_err();
        assert!(
            matches!(err, ExecError::ShutdownTimeout { live: 1, timeout_ms: 50 }),
            "{err}"
        );
        assert!(start.elapsed() < Duration::from_millis(1_000));
    }

    #[test]
    fn shutdown_waits_for_all_workers() {
        let pool = WorkerPool::new(3).unwrap();
        let liveness = Arc::clone(&pool.liveness);
        pool.shutdown(Duration::from_secs(5)).unwrap();
        assert_eq!(liveness.live(), 0);
    }
}
