use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The live page no longer carries the payload shape we know how to read.
    #[error("Source format changed: {0}")]
    FormatDrift(String),

    #[error("Telegram rejected message ({status}): {body}")]
    Telegram { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Why a single match card was dropped. Never escalated past the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing home team name")]
    MissingHomeTeam,

    #[error("missing away team name")]
    MissingAwayTeam,

    #[error("missing competition label")]
    MissingCompetition,

    #[error("unparsable score {0:?}")]
    BadScore(String),
}
