//! Counting gate bounding concurrent downloads
//!
//! A thin layer over [`tokio::sync::Semaphore`] that also tracks how many
//! permits are held right now and the highest number ever held at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting concurrency limiter with live instrumentation
#[derive(Debug, Clone)]
pub struct ResourceGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ResourceGate {
    /// Creates a gate admitting at most `capacity` holders at once
    ///
    /// A capacity of zero is raised to one so the gate can always make progress.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free unit
    ///
    /// Fails only if the gate has been closed.
    pub async fn acquire(&self) -> Result<GatePermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Refuses every pending and future acquire
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Maximum number of concurrent holders
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits held at the same time so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// One held unit of a [`ResourceGate`], released on drop
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is released.
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
