//! Retry policy for callers. The client itself never retries.

use std::time::Duration;

use crate::error::WebChatError;

/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 1000;

/// Transient statuses worth another attempt.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Transport failures and transient statuses; never configuration or auth problems.
pub fn is_retryable(error: &WebChatError) -> bool {
    match error {
        WebChatError::Transport(_) => true,
        WebChatError::Status { status, .. } => is_retryable_status(status.as_u16()),
        _ => false,
    }
}

/// Compute exponential backoff delay for a retry attempt.
pub fn retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.min(30);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(exponent)))
}
