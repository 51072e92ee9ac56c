use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Listing;

pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Listings waiting to be collected through `GET /pull_listings`.
///
/// The poller pushes, the HTTP handler drains. Draining takes the whole
/// contents and leaves the buffer empty under a single lock acquisition.
/// At most `capacity` listings are held; pushing past that drops the oldest.
#[derive(Debug, Clone)]
pub struct PullBuffer {
    inner: Arc<Mutex<VecDeque<Listing>>>,
    capacity: usize,
}

impl Default for PullBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl PullBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY)))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, listing: Listing) {
        let mut listings = self.lock();
        while listings.len() >= self.capacity {
            if let Some(dropped) = listings.pop_front() {
                tracing::warn!("Pull buffer full ({}), dropping {}", self.capacity, dropped.url);
            }
        }
        listings.push_back(listing);
    }

    pub fn drain(&self) -> Vec<Listing> {
        Vec::from(std::mem::take(&mut *self.lock()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Listing>> {
        // A panic while holding the lock cannot leave the queue half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
