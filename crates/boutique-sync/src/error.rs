//! 错误类型
//!
//! 分类：
//! - `Network` / `Http`：远端失败，Store 层统一吸收为 `is_online = false`
//! - `Validation` / `NotFound`：调用方错误，发起网络请求前同步返回
//! - 其余为本地基础设施错误（序列化、KV、配置、IO）

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum BoutiqueSDKError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status}")]
    Http {
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("Invalid {field}: {msg}")]
    Validation { field: String, msg: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("KV store error: {0}")]
    KvStore(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(String),
}

impl BoutiqueSDKError {
    /// 创建网络错误（传输失败或超时）
    pub fn network<T: fmt::Display>(msg: T) -> Self {
        let msg = msg.to_string();
        tracing::debug!("Network error: {}", msg);
        Self::Network(msg)
    }

    /// 创建 HTTP 错误（非 2xx 响应）
    pub fn http(status: u16, body: Option<serde_json::Value>) -> Self {
        tracing::debug!("HTTP error: status={} body={:?}", status, body);
        Self::Http { status, body }
    }

    /// 创建校验错误
    pub fn validation(field: &str, msg: &str) -> Self {
        tracing::warn!("Invalid {}: {}", field, msg);
        Self::Validation {
            field: field.to_string(),
            msg: msg.to_string(),
        }
    }

    /// 是否属于「服务器/网络问题」（Store 层按离线处理）
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http { .. } | Self::Serialization(_)
        )
    }

    /// 是否属于调用方输入错误
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP 状态码（仅 `Http` 变体）
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BoutiqueSDKError {
    fn from(error: serde_json::Error) -> Self {
        BoutiqueSDKError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for BoutiqueSDKError {
    fn from(error: std::io::Error) -> Self {
        BoutiqueSDKError::IO(error.to_string())
    }
}

impl From<sled::Error> for BoutiqueSDKError {
    fn from(error: sled::Error) -> Self {
        BoutiqueSDKError::KvStore(error.to_string())
    }
}

impl From<reqwest::Error> for BoutiqueSDKError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return BoutiqueSDKError::network("request timed out");
        }
        if error.is_decode() {
            return BoutiqueSDKError::Serialization(error.to_string());
        }
        if let Some(status) = error.status() {
            return BoutiqueSDKError::http(status.as_u16(), None);
        }
        BoutiqueSDKError::network(error)
    }
}

pub type Result<T> = std::result::Result<T, BoutiqueSDKError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_classification() {
        assert!(BoutiqueSDKError::network("timeout").is_remote());
        assert!(BoutiqueSDKError::http(500, None).is_remote());
        assert!(!BoutiqueSDKError::validation("quantity", "must be >= 0").is_remote());
        assert!(!BoutiqueSDKError::NotFound("p1".into()).is_remote());
    }

    #[test]
    fn test_http_status_and_display() {
        let err = BoutiqueSDKError::http(404, Some(serde_json::json!({"message": "gone"})));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error: status 404");

        let err = BoutiqueSDKError::validation("price", "must not be negative");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid price: must not be negative");
    }

    #[test]
    fn test_question_mark_conversions() {
        fn parse(raw: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(raw)?)
        }
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, BoutiqueSDKError::Serialization(_)));
        assert!(err.is_remote());

        fn read(path: &str) -> Result<Vec<u8>> {
            Ok(std::fs::read(path)?)
        }
        let err = read("/nonexistent/boutique/file").unwrap_err();
        assert!(matches!(err, BoutiqueSDKError::IO(_)));
        assert!(!err.is_remote());
    }
}
