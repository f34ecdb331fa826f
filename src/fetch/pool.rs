use crate::fetch::FetchError;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Fixed-size pool of exclusive workers
///
/// At most `size` guards are handed out at a time. A guard returns its worker
/// to the pool when it is released or dropped, so a failing request can never
/// leak a worker.
#[derive(Debug)]
pub struct WorkerPool<T> {
    permits: Semaphore,
    idle: Mutex<Vec<T>>,
    size: usize,
}

impl<T: Send> WorkerPool<T> {
    pub fn new(workers: Vec<T>) -> Self {
        let size = workers.len();
        Self {
            permits: Semaphore::new(size),
            idle: Mutex::new(workers),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of workers currently checked out
    pub fn in_use(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    /// Waits for an idle worker and checks it out
    ///
    /// # Returns
    ///
    /// * `Ok(PoolGuard)` - Exclusive access to one worker
    /// * `Err(FetchError::PoolClosed)` - The pool has been drained
    pub async fn acquire(&self) -> Result<PoolGuard<'_, T>, FetchError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchError::PoolClosed)?;

        let worker = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or(FetchError::PoolClosed)?;

        Ok(PoolGuard {
            pool: self,
            worker: Some(worker),
            _permit: permit,
        })
    }

    /// Waits until every worker is idle, closes the pool and hands the
    /// workers back for teardown
    pub async fn drain(&self) -> Result<Vec<T>, FetchError> {
        let permits = u32::try_from(self.size).map_err(|_| FetchError::PoolClosed)?;
        let all = self
            .permits
            .acquire_many(permits)
            .await
            .map_err(|_| FetchError::PoolClosed)?;

        self.permits.close();
        let workers =
            std::mem::take(&mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner));
        drop(all);
        Ok(workers)
    }

    fn put_back(&self, worker: T) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);
    }
}

/// Exclusive handle on one pooled worker
pub struct PoolGuard<'a, T: Send> {
    pool: &'a WorkerPool<T>,
    worker: Option<T>,
    _permit: SemaphorePermit<'a>,
}

impl<T: Send> Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only emptied in Drop
        match &self.worker {
            Some(worker) => worker,
            None => unreachable!("pool guard used after release"),
        }
    }
}

impl<T: Send> DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.worker {
            Some(worker) => worker,
            None => unreachable!("pool guard used after release"),
        }
    }
}

impl<T: Send> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        // Worker goes back before the permit is released
        if let Some(worker) = self.worker.take() {
            self.pool.put_back(worker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let pool = WorkerPool::new(vec![1, 2]);

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 2);
        assert_ne!(*a, *b);

        drop(a);
        assert_eq!(pool.in_use(), 1);
        drop(b);
        assert_eq!(pool.in_use(), 0);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let pool = Arc::new(WorkerPool::new(vec!["tab"]));
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let guard = pool.acquire().await.unwrap();
                let worker = *guard;
                drop(guard);
                worker
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap(), "tab");
    }

    #[tokio::test]
    async fn test_never_more_than_size_in_flight() {
        let pool = Arc::new(WorkerPool::new(vec![(), (), ()]));
        let peak = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = pool.acquire().await.unwrap();
                    peak.fetch_max(pool.in_use(), std::sync::atomic::Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(std::sync::atomic::Ordering::SeqCst) <= 3);
        assert_eq!(pool.in_use(), 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_work() {
        let pool = Arc::new(WorkerPool::new(vec![1, 2]));
        let guard = pool.acquire().await.unwrap();

        let drainer = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.drain().await.unwrap().len() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!drainer.is_finished());

        drop(guard);
        assert_eq!(drainer.await.unwrap(), 2);
        assert!(matches!(pool.acquire().await, Err(FetchError::PoolClosed)));
    }
}
