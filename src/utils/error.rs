use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    ProcessingError { message: String },

    #[error("{failed} of {total} images failed to download")]
    PartialFailure { failed: usize, total: usize },

    #[error("Download task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

/// 錯誤類別，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
    Runtime,
}

/// 錯誤嚴重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FetchError {
    pub fn processing(message: impl Into<String>) -> Self {
        FetchError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        FetchError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::ApiError(_) | FetchError::HttpStatusError { .. } => ErrorCategory::Network,
            FetchError::IoError(_) | FetchError::CsvError(_) => ErrorCategory::Storage,
            FetchError::SerializationError(_) | FetchError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            FetchError::TomlError(_)
            | FetchError::ConfigError { .. }
            | FetchError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            FetchError::PartialFailure { .. } | FetchError::TaskError(_) => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
            ErrorCategory::Runtime => match self {
                FetchError::PartialFailure { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::Critical,
            },
        }
    }

    /// 進程退出碼：設定/資料 1、網路 2、儲存 3、部分失敗 4
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchError::PartialFailure { .. } => 4,
            _ => match self.category() {
                ErrorCategory::Configuration | ErrorCategory::Data => 1,
                ErrorCategory::Network => 2,
                ErrorCategory::Storage | ErrorCategory::Runtime => 3,
            },
        }
    }

    /// Network errors and 5xx/429 responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::HttpStatusError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FetchError::ApiError(_) => "Check network access to the repository and try again",
            FetchError::HttpStatusError { status: 404, .. } => {
                "Check that the PID exists in the repository"
            }
            FetchError::HttpStatusError { .. } => "The server rejected the request; retry later",
            FetchError::IoError(_) => "Check that the output directory is writable and has free space",
            FetchError::SerializationError(_) => "The API returned unexpected data; check the PID",
            FetchError::TomlError(_) => "Fix the syntax of the configuration file",
            FetchError::CsvError(_) => "Check that the manifest file is writable",
            FetchError::ConfigError { .. } | FetchError::InvalidConfigValueError { .. } => {
                "Review the command line flags and configuration file"
            }
            FetchError::ProcessingError { .. } => {
                "Make sure the PID refers to a multi-page parent item"
            }
            FetchError::PartialFailure { .. } => {
                "Re-run the same command; existing images are skipped"
            }
            FetchError::TaskError(_) => "Re-run the command; this is likely a transient failure",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FetchError::ApiError(e) if e.is_timeout() => "Request timed out".to_string(),
            FetchError::ApiError(e) if e.is_connect() => {
                "Could not connect to the repository".to_string()
            }
            FetchError::HttpStatusError { status, url } => {
                format!("HTTP Error {}: {}", status, url)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_category() {
        assert_eq!(FetchError::config("bad").exit_code(), 1);
        assert_eq!(FetchError::processing("No valid child PIDs found.").exit_code(), 1);
        let http = FetchError::HttpStatusError {
            status: 404,
            url: "http://x/".to_string(),
        };
        assert_eq!(http.exit_code(), 2);
        let io = FetchError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), 3);
        assert_eq!(FetchError::PartialFailure { failed: 1, total: 3 }.exit_code(), 4);
    }

    #[test]
    fn test_retryable_statuses() {
        let status = |s| FetchError::HttpStatusError {
            status: s,
            url: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!FetchError::processing("x").is_retryable());
    }

    #[test]
    fn test_processing_message_is_verbatim() {
        let err = FetchError::processing("No relations found in parent data.");
        assert_eq!(err.to_string(), "No relations found in parent data.");
        assert_eq!(err.category(), ErrorCategory::Data);
    }
}
