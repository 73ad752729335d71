//! Shared types and utilities for claims dashboard notification providers
//!
//! This library provides the provider interface, error taxonomy, payloads and
//! bounded retry helpers used by every outbound delivery channel.

pub mod payloads;
pub mod provider_base;
pub mod retry;
pub mod types;

// Re-export commonly used types
pub use payloads::*;
pub use provider_base::{NotificationProvider, ProviderError};
pub use retry::{retry_with_backoff, IsRetryable, RetryConfig, RetryOutcome};
pub use types::*;
