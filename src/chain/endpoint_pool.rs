use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use crate::error::PoolError;

/// Ordered list of ledger node URLs with a shared "current" cursor.
///
/// The first entry is the preferred node; rotation walks the list round-robin
/// and never drops an entry. The cursor is an atomic so one pool can be shared
/// by every in-flight request.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<String>,
    current: AtomicUsize,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<String>) -> Result<Self, PoolError> {
        if endpoints.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self {
            endpoints,
            current: AtomicUsize::new(0),
        })
    }

    pub fn index(&self) -> usize {
        self.current.load(Ordering::Acquire) % self.endpoints.len()
    }

    pub fn current(&self) -> &str {
        &self.endpoints[self.index()]
    }

    /// Advance to the next endpoint and return it.
    pub fn rotate(&self) -> &str {
        let len = self.endpoints.len();
        let previous = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |idx| Some((idx + 1) % len))
            .unwrap_or_else(|idx| idx);
        let next = &self.endpoints[(previous + 1) % len];
        info!("Switching to RPC endpoint: {}", next);
        next
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}
