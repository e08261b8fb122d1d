use serde::{Deserialize, Serialize};
use std::fmt;

use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletError {
    // Signing agent errors
    AgentUnavailable(String),
    AgentDisabled(String),
    AccessDenied(String),
    NetworkQueryFailed(String),
    ManualSwitchRequired(Network),

    // Ledger errors
    BalanceFetchFailed(String),
    NetworkError(String),

    // Session errors
    OperationInProgress,
    NotConnected,
    Cancelled,

    // Validation errors
    ValidationError(String),
    InvalidAddress(String),
    InvalidAmount(String),

    // Storage errors
    StorageError(String),
    FileNotFound(String),
    PermissionDenied(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WalletError::AgentUnavailable(msg) => write!(f, "{}", msg),
            WalletError::AgentDisabled(msg) => write!(f, "{}", msg),
            WalletError::AccessDenied(msg) => write!(f, "{}", msg),
            WalletError::NetworkQueryFailed(msg) => write!(f, "{}", msg),
            WalletError::ManualSwitchRequired(target) => write!(
                f,
                "Please switch to {} in your Freighter wallet settings, then reconnect.",
                target.display_name()
            ),

            WalletError::BalanceFetchFailed(msg) => write!(f, "Balance fetch failed: {}", msg),
            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),

            WalletError::OperationInProgress => {
                write!(f, "Another wallet operation is already in progress")
            }
            WalletError::NotConnected => write!(f, "Wallet is not connected"),
            WalletError::Cancelled => write!(f, "Operation cancelled by disconnect"),

            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            WalletError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),

            WalletError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            WalletError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            WalletError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

pub type WalletResult<T> = Result<T, WalletError>;

// Helper macro for easy error creation
#[macro_export]
macro_rules! wallet_error {
    ($variant:ident, $msg:expr) => {
        $crate::errors::WalletError::$variant($msg.to_string())
    };
    ($variant:ident) => {
        $crate::errors::WalletError::$variant
    };
}

// Conversion helpers
impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => WalletError::FileNotFound(error.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                WalletError::PermissionDenied(error.to_string())
            }
            _ => WalletError::StorageError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(error: serde_json::Error) -> Self {
        WalletError::ValidationError(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(error: reqwest::Error) -> Self {
        WalletError::NetworkError(error.to_string())
    }
}
