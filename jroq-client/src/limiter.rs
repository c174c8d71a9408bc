//! Admission gate bounding in-flight calls
//!
//! At most `bound` calls may be outstanding per client at once. A call that
//! arrives while the bound is reached waits for a slot instead of growing
//! the pending table and flooding the broker. The permit is held from
//! admission until the call resolves, so a slot frees exactly when a reply
//! arrives, the call times out, or the codec fails the call.
//!
//! The limiter composes with the client from the outside of the publish
//! path: it gates call issuance and knows nothing about queues or
//! envelopes.

use jroq_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default bound on simultaneously in-flight calls per client.
pub const DEFAULT_IN_FLIGHT_BOUND: usize = 100;

/// Counting admission gate for call issuance.
pub struct InFlightLimiter {
    permits: Arc<Semaphore>,
    bound: usize,
}

/// Guard for one admitted call. Dropping it frees the slot.
pub struct InFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl InFlightLimiter {
    /// Create a limiter admitting up to `bound` concurrent calls.
    pub fn new(bound: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(bound)),
            bound,
        }
    }

    /// Wait for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] when the limiter was closed while
    /// waiting, which happens when the owning client shuts down.
    pub async fn acquire(&self) -> Result<InFlightPermit> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::TransportClosed)?;
        Ok(InFlightPermit { _permit: permit })
    }

    /// Close the gate: waiting and future acquisitions fail.
    pub fn close(&self) {
        self.permits.close();
    }

    /// The configured bound.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_up_to_bound() {
        let limiter = InFlightLimiter::new(3);
        let _a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();
        let _c = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test]
    async fn test_excess_acquire_blocks_until_release() {
        let limiter = InFlightLimiter::new(2);
        let a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();

        // The third admission must not complete while both slots are held.
        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());

        drop(a);
        let third = tokio::time::timeout(Duration::from_millis(500), limiter.acquire())
            .await
            .expect("slot freed by release");
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_drop_frees_slot() {
        let limiter = InFlightLimiter::new(1);
        {
            let _permit = limiter.acquire().await.unwrap();
            assert_eq!(limiter.available(), 0);
        }
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_close_fails_waiters() {
        let limiter = Arc::new(InFlightLimiter::new(1));
        let _held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        limiter.close();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::TransportClosed)));
    }

    #[tokio::test]
    async fn test_acquire_after_close_fails() {
        let limiter = InFlightLimiter::new(4);
        limiter.close();
        assert!(matches!(
            limiter.acquire().await,
            Err(Error::TransportClosed)
        ));
    }
}
