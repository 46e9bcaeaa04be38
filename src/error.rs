//! Unified error handling for the coupon-audit crate
//!
//! Each concern owns its error enum; [`Error`] wraps them so that the
//! application layer can use one type with `?`.
//!
//! - [`AuditErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::notifications::ChannelError;
pub use crate::redeem::RedeemError;
pub use crate::status::ServerError;
pub use crate::storage::JournalError;

/// Common trait for coupon-audit error types
pub trait AuditErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, bad status)
    Network,
    /// Response decoding errors
    Parsing,
    /// Journal and other I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Listener and serving errors
    Server,
}

/// Unified error type for the coupon-audit crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Redemption error: {0}")]
    Redeem(#[from] RedeemError),

    #[error("Notification error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AuditErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Redeem(e) => e.is_recoverable(),
            Self::Channel(ChannelError::InvalidConfig(_)) => false,
            Self::Channel(_) => true,
            Self::Journal(_) | Self::Io(_) => true,
            Self::Config(_) | Self::Server(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Redeem(RedeemError::Decode(_)) => ErrorCategory::Parsing,
            Self::Redeem(RedeemError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Redeem(_) => ErrorCategory::Network,
            Self::Channel(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Channel(_) => ErrorCategory::Network,
            Self::Journal(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Server(_) => ErrorCategory::Server,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
