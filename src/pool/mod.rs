//! Bounded pool of exclusive worker handles
//!
//! The linguistic kernel is not safe for concurrent use, so every kernel
//! instance lives behind exactly one pool slot. Permits and workers are
//! provisioned 1:1 at construction and only ever move together inside a
//! [`WorkerLease`], which makes pool underflow unreachable: a lease owns
//! the worker value itself and pushes it back before its permit is
//! released.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Errors raised by the pool
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool's semaphore was closed; only possible during shutdown
    #[error("worker pool is shut down")]
    Closed,
}

/// A fixed-size pool of long-lived workers.
///
/// `acquire` waits without timeout until a worker is free; waiters are
/// admitted in no contractually guaranteed order, and freed workers are
/// reused last-in-first-out.
#[derive(Debug)]
pub struct WorkerPool<W> {
    permits: Arc<Semaphore>,
    slots: Arc<Mutex<Vec<W>>>,
    capacity: usize,
}

impl<W: Send + 'static> WorkerPool<W> {
    /// Create a pool owning the given workers.
    ///
    /// The pool size is fixed at `workers.len()` for its whole lifetime.
    /// Panics when called with no workers: a zero-capacity pool could
    /// never serve a request.
    pub fn new(workers: Vec<W>) -> Self {
        assert!(!workers.is_empty(), "worker pool requires at least one worker");
        let capacity = workers.len();
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            slots: Arc::new(Mutex::new(workers)),
            capacity,
        }
    }

    /// Check out a worker, waiting until one is free.
    pub async fn acquire(&self) -> Result<WorkerLease<W>, PoolError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let worker = self
            .slots
            .lock()
            .unwrap()
            .pop()
            .expect("permit held without a pooled worker");
        tracing::trace!(available = self.available(), "worker checked out");
        Ok(WorkerLease {
            worker: Some(worker),
            slots: self.slots.clone(),
            _permit: permit,
        })
    }

    /// Number of workers the pool was built with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of workers currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Shut the pool down.
    ///
    /// Waiting and future `acquire` calls fail with [`PoolError::Closed`].
    /// Workers already checked out finish normally and are returned;
    /// worker resources are released when the pool itself is dropped.
    pub fn close(&self) {
        self.permits.close();
        tracing::debug!(capacity = self.capacity, "worker pool closed");
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

/// Exclusive checkout of one pool worker.
///
/// Dereferences to the worker. Dropping the lease returns the worker to
/// the pool on every exit path, errors included; the permit is released
/// only after the worker is back on the stack.
#[derive(Debug)]
pub struct WorkerLease<W: Send + 'static> {
    worker: Option<W>,
    slots: Arc<Mutex<Vec<W>>>,
    _permit: OwnedSemaphorePermit,
}

impl<W: Send + 'static> Deref for WorkerLease<W> {
    type Target = W;

    fn deref(&self) -> &W {
        self.worker.as_ref().expect("worker present until lease drop")
    }
}

impl<W: Send + 'static> DerefMut for WorkerLease<W> {
    fn deref_mut(&mut self) -> &mut W {
        self.worker.as_mut().expect("worker present until lease drop")
    }
}

impl<W: Send + 'static> Drop for WorkerLease<W> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.slots.lock().unwrap().push(worker);
        }
        // `_permit` drops after this body, releasing the slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_acquire_returns_a_worker() {
        let pool = WorkerPool::new(vec!["a"]);
        let lease = pool.acquire().await.unwrap();
        assert_eq!(*lease, "a");
        assert_eq!(pool.available(), 0);
    }

    #[tokio::test]
    async fn test_drop_returns_worker_to_pool() {
        let pool = WorkerPool::new(vec![1u32]);
        {
            let _lease = pool.acquire().await.unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
        let lease = pool.acquire().await.unwrap();
        assert_eq!(*lease, 1);
    }

    #[tokio::test]
    async fn test_freed_workers_are_reused_lifo() {
        let pool = WorkerPool::new(vec!["bottom", "top"]);
        let first = pool.acquire().await.unwrap();
        assert_eq!(*first, "top");
        drop(first);
        let again = pool.acquire().await.unwrap();
        assert_eq!(*again, "top");
    }

    #[tokio::test]
    async fn test_capacity_bounds_concurrent_checkouts() {
        let pool = WorkerPool::new(vec![(), ()]);
        let _a = pool.acquire().await.unwrap();
        let _b = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        // Third caller must wait until a lease drops
        let mut waiter = tokio_test::task::spawn(pool.acquire());
        assert!(waiter.poll().is_pending());
        drop(_a);
        assert!(waiter.poll().is_ready());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mutual_exclusion_with_single_worker() {
        let pool = Arc::new(WorkerPool::new(vec![()]));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let pool = pool.clone();
            let in_flight = in_flight.clone();
            handles.push(tokio::spawn(async move {
                let _lease = pool.acquire().await.unwrap();
                let now = in_flight.fetch_add(1, Ordering::SeqCst);
                assert_eq!(now, 0, "two leases live at once");
                tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(pool.available(), 1);
    }

    #[test]
    #[should_panic(expected = "at least one worker")]
    fn test_empty_pool_is_rejected() {
        let _ = WorkerPool::<()>::new(Vec::new());
    }

    #[tokio::test]
    async fn test_acquire_after_close_fails() {
        let pool = WorkerPool::new(vec![()]);
        pool.close();
        assert!(pool.is_closed());
        assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn test_checked_out_worker_survives_close() {
        let pool = WorkerPool::new(vec![7u32]);
        let lease = pool.acquire().await.unwrap();
        pool.close();
        assert_eq!(*lease, 7);
        drop(lease);
        // The worker returns even though no one can check it out again
        assert!(pool.acquire().await.is_err());
    }
}
