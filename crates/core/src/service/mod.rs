//! The boundary to the data services.
//!
//! Everything that crosses it goes through [`guarded`], so the state machines
//! above only ever see a value: the real result, or a well-typed fallback
//! together with the [`ErrorKind`] that caused it.

pub mod http;

use std::{future::Future, time::Duration};

use atlas_transit::{ErrorKind, ServiceError};

pub use http::HttpTransitService;

/// Outcome of a guarded call
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub error: Option<ErrorKind>,
}

impl<T> Fetched<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs `fut` under `timeout`. Failures and timeouts resolve to `fallback`.
pub async fn guarded<T, F>(label: &str, timeout: Duration, fut: F, fallback: T) -> Fetched<T>
where
    F: Future<Output = atlas_transit::Result<T>>,
{
    let error = match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => return Fetched { value, error: None },
        Ok(Err(error)) => error,
        Err(_) => ServiceError::Timeout(timeout.as_millis() as u64),
    };

    tracing::warn!(kind = ?error.kind(), "{label} failed, using fallback: {error}");
    Fetched {
        value: fallback,
        error: Some(error.kind()),
    }
}

/// A transient, non-blocking message for the user
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn for_failure(kind: ErrorKind, what: &str) -> Self {
        let message = match kind {
            ErrorKind::Network => format!("Could not load {what}: the service is unreachable"),
            ErrorKind::Validation => format!("Could not load {what}: unexpected response"),
            ErrorKind::Geometry => format!("Could not show {what}: invalid geometry"),
            ErrorKind::Unknown => format!("Could not load {what}"),
        };
        Self::new(kind, message)
    }
}
