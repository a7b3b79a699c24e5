//! Process-wide throttle for outbound provider calls.
//!
//! A [`Limiter`] is a counting semaphore with FIFO wake-up order. Permits are
//! RAII guards: a [`Permit`] returns itself to the pool when dropped, so no
//! exit path (error, timeout, panic unwinding) can leak one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Default number of provider calls allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LimiterError {
    #[error("limiter capacity must be at least 1")]
    ZeroCapacity,

    #[error("timed out after {0:?} waiting for a permit")]
    Timeout(Duration),

    #[error("limiter has been closed")]
    Closed,
}

/// Shared counting semaphore. Cloning yields another handle to the same pool.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of concurrency allowance. Released on drop.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Limiter {
    /// Create a limiter with a fixed capacity.
    ///
    /// # Returns
    /// `Err(LimiterError::ZeroCapacity)` when `capacity` is 0; a limiter that
    /// can never grant a permit is a configuration error.
    pub fn new(capacity: usize) -> Result<Self, LimiterError> {
        if capacity == 0 {
            return Err(LimiterError::ZeroCapacity);
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until a permit is free.
    ///
    /// Waiters are served in the order they started waiting.
    pub async fn acquire(&self) -> Result<Permit, LimiterError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LimiterError::Closed)?;
        debug!("Permit acquired ({} of {} free)", self.available(), self.capacity);
        Ok(Permit { _permit: permit })
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    ///
    /// `None` waits indefinitely.
    pub async fn acquire_timeout(&self, timeout: Option<Duration>) -> Result<Permit, LimiterError> {
        match timeout {
            None => self.acquire().await,
            Some(limit) => tokio::time::timeout(limit, self.acquire())
                .await
                .map_err(|_| LimiterError::Timeout(limit))?,
        }
    }

    /// Number of permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            capacity: DEFAULT_CONCURRENCY,
        }
    }
}
