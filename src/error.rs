//! Các error type của crate
//!
//! - `ConnectionError`: lỗi ở tầng RPC client (địa chỉ sai, transport, response lỗi)
//! - `WalletError`: lỗi ở tầng ví/store, được trả về cho UI

use thiserror::Error;

/// Lỗi khi truy vấn RPC qua connection client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Địa chỉ không parse được sang key type của ecosystem.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Lỗi mạng (không kết nối được, bị từ chối...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Node trả về JSON-RPC error object.
    #[error("RPC error: {message} (code: {code})")]
    Rpc { code: i64, message: String },

    /// Response không đúng định dạng mong đợi.
    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),

    /// Quá thời gian chờ.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ConnectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConnectionError::Timeout
        } else if err.is_decode() {
            ConnectionError::MalformedResponse(err.to_string())
        } else {
            ConnectionError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Chain not supported: {0}")]
    ChainNotSupported(String),
    #[error("{0} wallet not found. Please install the extension.")]
    WalletNotFound(String),
    #[error("Connection rejected: {0}")]
    ConnectionRejected(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

impl From<ConnectionError> for WalletError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::InvalidAddress(addr) => WalletError::InvalidAddress(addr),
            other => WalletError::ProviderError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        WalletError::StorageError(err.to_string())
    }
}

impl From<anyhow::Error> for WalletError {
    fn from(err: anyhow::Error) -> Self {
        // Giữ nguyên nếu bên trong là WalletError
        if let Some(wallet_err) = err.downcast_ref::<WalletError>() {
            return wallet_err.clone();
        }

        WalletError::AnyhowError(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_conversion() {
        let err: WalletError = ConnectionError::InvalidAddress("abc".to_string()).into();
        assert_eq!(err, WalletError::InvalidAddress("abc".to_string()));

        let err: WalletError = ConnectionError::Timeout.into();
        assert!(matches!(err, WalletError::ProviderError(_)));
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_wallet_error() {
        let original = WalletError::WalletNotFound("phantom".to_string());
        let converted: WalletError = anyhow::Error::new(original.clone()).into();
        assert_eq!(converted, original);
        assert_eq!(
            original.to_string(),
            "phantom wallet not found. Please install the extension."
        );
    }
}
