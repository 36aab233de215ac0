//! Failure kinds that callers need to tell apart.

use thiserror::Error;

/// Why a calendar read did not produce events.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// No usable credential, even after a refresh attempt. Fixing it
    /// needs an operator to (re)authorize access.
    #[error("no usable Google credentials")]
    Unauthenticated,
    /// Anything else that went wrong talking to Google or the store.
    #[error("upstream request failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

/// The follow-up message for an interaction could not be sent.
#[derive(Debug, Error)]
#[error("failed to deliver follow-up message: {0:#}")]
pub struct DeliveryFailure(#[from] pub anyhow::Error);
