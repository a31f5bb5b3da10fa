//! Rolling-window admission control for remote service calls.
//!
//! This module provides the [`PermitPool`] which bounds calls to a remote
//! service at `capacity` per rolling `window`.
//!
//! # Overview
//!
//! Every call takes one permit, waiting if none is free. When the call
//! completes its permit is not returned right away: a timer hands it back
//! exactly `window` later. Each completed call runs its own timer, so the
//! pool refills in the same rhythm the calls were made rather than smoothly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use collection_factory::gateway::PermitPool;
//!
//! # async fn example() -> Result<(), collection_factory::gateway::GatewayError> {
//! // 60 calls per minute
//! let pool = PermitPool::new(60, Duration::from_secs(60))?;
//!
//! let permit = pool.acquire().await?;
//! // ... make the call
//! drop(permit); // returned to the pool 60 seconds from now
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, trace, warn};

use super::GatewayError;

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Counting permit pool with delayed, per-call permit return.
///
/// Cloning shares the underlying pool, so a gateway and its credential
/// exchange draw from the same budget.
#[derive(Debug, Clone)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    window: Duration,
}

impl PermitPool {
    /// Creates a pool of `capacity` permits, each returned `window` after use.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if `capacity` is zero or larger
    /// than the semaphore supports.
    #[instrument(skip_all, fields(capacity = capacity, window_secs = window.as_secs()))]
    pub fn new(capacity: usize, window: Duration) -> Result<Self, GatewayError> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(GatewayError::invalid_config(&format!(
                "permit capacity must be between 1 and {}, got {capacity}",
                Semaphore::MAX_PERMITS
            )));
        }
        debug!("creating permit pool");
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            window,
        })
    }

    /// Returns the configured number of permits.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the delay before a used permit becomes available again.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the number of permits that can be taken without waiting.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Takes one permit, waiting until one is free.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PermitPoolClosed`] if the semaphore was closed.
    pub async fn acquire(&self) -> Result<CallPermit, GatewayError> {
        if self.semaphore.available_permits() == 0 {
            debug!(
                capacity = self.capacity,
                "all permits in use, waiting for one to return"
            );
        }
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::PermitPoolClosed)?;
        trace!(available = self.available(), "permit acquired");
        Ok(CallPermit {
            permit: Some(permit),
            window: self.window,
        })
    }
}

/// A permit held for the duration of one remote call.
///
/// Dropping it schedules the permit's return `window` later. Outside a Tokio
/// runtime the permit is returned immediately.
#[derive(Debug)]
pub struct CallPermit {
    permit: Option<OwnedSemaphorePermit>,
    window: Duration,
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        if self.window.is_zero() {
            return;
        }
        let window = self.window;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(window).await;
                    drop(permit);
                });
            }
            Err(_) => drop(permit),
        }
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use collection_factory::gateway::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping at 1 hour"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();

        if let Ok(duration) = datetime.duration_since(now) {
            if duration > MAX_RETRY_AFTER {
                warn!(
                    delay_secs = duration.as_secs(),
                    max_secs = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After date exceeds maximum, capping at 1 hour"
                );
                return Some(MAX_RETRY_AFTER);
            }
            Some(duration)
        } else {
            debug!(
                header_value,
                "Retry-After date is in the past, returning zero"
            );
            Some(Duration::ZERO)
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
