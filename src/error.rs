//! Error types and handling for the `InboundAI` service

use thiserror::Error;

/// Main error type for the `InboundAI` library
#[derive(Error, Debug)]
pub enum InboundAiError {
    /// Configuration-related errors (missing keys, invalid values)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External API communication errors
    #[error("API error ({service}): {message}")]
    Api {
        service: &'static str,
        message: String,
        status: Option<u16>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Dataset loading or consistency errors
    #[error("Data error: {message}")]
    Data { message: String },

    /// Not enough full seasonal cycles to fit a forecast model
    #[error("Insufficient history for {country}: {cycles} full cycles, {required} required")]
    InsufficientHistory {
        country: String,
        cycles: usize,
        required: usize,
    },

    /// Language model call failures
    #[error("LLM error: {message}")]
    Llm { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl InboundAiError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error without an HTTP status
    pub fn api<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::Api {
            service,
            message: message.into(),
            status: None,
        }
    }

    /// Create a new API error carrying the HTTP status returned by the service
    pub fn api_status<S: Into<String>>(service: &'static str, status: u16, message: S) -> Self {
        Self::Api {
            service,
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new LLM error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-facing message suitable for an inline page notice
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            InboundAiError::Config { .. } => {
                "⚙️ 서비스 설정이 올바르지 않습니다. API 키 설정을 확인해 주세요.".to_string()
            }
            InboundAiError::Api { status, .. } => match status {
                Some(code) => format!("❌ API 요청 실패! ({code}) 다시 시도해 주세요."),
                None => "❌ API 요청 실패! 다시 시도해 주세요.".to_string(),
            },
            InboundAiError::Validation { message } => format!("⚠️ 입력값 오류: {message}"),
            InboundAiError::Data { .. } => {
                "📂 데이터를 불러오지 못했습니다. 데이터 파일을 확인해 주세요.".to_string()
            }
            InboundAiError::InsufficientHistory { country, .. } => {
                format!("📉 {country}의 과거 데이터가 부족해 예측할 수 없습니다.")
            }
            InboundAiError::Llm { .. } => {
                "⚠️ AI 여행 일정을 생성하는 중 문제가 발생했습니다. 잠시 후 다시 시도해주세요."
                    .to_string()
            }
            InboundAiError::Cache { .. } => {
                "캐시 처리 중 문제가 발생했습니다. 캐시 디렉터리를 확인해 주세요.".to_string()
            }
            InboundAiError::Io { .. } => {
                "파일 처리 중 문제가 발생했습니다. 파일 권한을 확인해 주세요.".to_string()
            }
            InboundAiError::General { message } => message.clone(),
        }
    }
}

impl From<csv::Error> for InboundAiError {
    fn from(err: csv::Error) -> Self {
        InboundAiError::data(err.to_string())
    }
}

impl From<anyhow::Error> for InboundAiError {
    fn from(err: anyhow::Error) -> Self {
        InboundAiError::cache(err.to_string())
    }
}
