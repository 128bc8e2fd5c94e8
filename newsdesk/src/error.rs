use thiserror::Error;

/// Failures surfaced to the user. None of them are fatal; the user retries by hand.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required input field was left empty
    #[error("{0}")]
    Validation(String),

    #[error("기사 추출 중 오류: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("기사 본문을 추출하지 못했습니다")]
    Extraction,

    #[error("API 호출 중 오류: {0:#}")]
    Api(#[source] anyhow::Error),

    #[error("클립보드 접근 중 오류: {0:#}")]
    Clipboard(#[source] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short machine-readable label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Fetch(_) => "fetch",
            Self::Extraction => "extraction",
            Self::Api(_) => "api",
            Self::Clipboard(_) => "clipboard",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
