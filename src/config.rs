use crate::error::{AppError, Result};
use crate::types::{DedupScope, MinuteWindow, RunMode};

pub const SOURCE_URL: &str = "https://onefootball.com/pt-br/jogos?only_live=true";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const REPORT_PATH: &str = "Relatorio_Jogos_0x0.xlsx";

/// Minutes are clamped to this cap after normalization.
pub const MAX_MINUTES: u32 = 120;

/// Default lower bound of the scoreless window.
pub const MIN_MINUTES: u32 = 20;

/// Default wait between poll cycles (seconds).
pub const POLL_INTERVAL_SECS: u64 = 900;

/// How many qualifying matches are listed on the console each cycle.
pub const SHOW_LIMIT: usize = 10;

/// Timeout for the live page fetch (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 20;

/// Timeout for one Telegram sendMessage call (seconds).
pub const TELEGRAM_TIMEOUT_SECS: u64 = 5;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Time strings that mean the clock is not running. Compared case-insensitively.
pub const TIME_SENTINELS: &[&str] = &["não iniciado", "intervalo"];

/// Report header fill, RGB.
pub const HEADER_COLOR: u32 = 0x2A629A;

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub log_level: String,
    /// Telegram bot token (TELEGRAM_BOT_TOKEN). None disables outbound alerts.
    pub telegram_token: Option<String>,
    /// Target chat (TELEGRAM_CHAT_ID). Required when a token is set.
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
    /// Normalizer clamp (MAX_MINUTES)
    pub max_minutes: u32,
    /// Scoreless window (MIN_MINUTES, optional WINDOW_MAX_MINUTES)
    pub window: MinuteWindow,
    pub poll_interval_secs: u64,
    pub show_limit: usize,
    pub report_path: String,
    pub run_mode: RunMode,
    pub dedup_scope: DedupScope,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let telegram_token = optional_var("TELEGRAM_BOT_TOKEN");
        let telegram_chat_id = optional_var("TELEGRAM_CHAT_ID");
        if telegram_token.is_some() && telegram_chat_id.is_none() {
            return Err(AppError::Config(
                "TELEGRAM_CHAT_ID must be set when TELEGRAM_BOT_TOKEN is set".to_string(),
            ));
        }

        let max_minutes = parse_var("MAX_MINUTES", MAX_MINUTES)?;
        let min_minutes = parse_var("MIN_MINUTES", MIN_MINUTES)?;
        let upper = match optional_var("WINDOW_MAX_MINUTES") {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                AppError::Config("WINDOW_MAX_MINUTES must be a whole number of minutes".to_string())
            })?),
            None => None,
        };
        let window = MinuteWindow::new(min_minutes, upper, max_minutes)?;

        let run_mode = match std::env::var("RUN_MODE") {
            Ok(s) => s.parse()?,
            Err(_) => RunMode::Loop,
        };
        let dedup_scope = match std::env::var("DEDUP_SCOPE") {
            Ok(s) => s.parse()?,
            Err(_) => DedupScope::Process,
        };

        Ok(Self {
            source_url: std::env::var("SOURCE_URL").unwrap_or_else(|_| SOURCE_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            telegram_token,
            telegram_chat_id,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string()),
            max_minutes,
            window,
            poll_interval_secs: parse_var("POLL_INTERVAL_SECS", POLL_INTERVAL_SECS)?,
            show_limit: parse_var("SHOW_LIMIT", SHOW_LIMIT)?,
            report_path: std::env::var("REPORT_PATH").unwrap_or_else(|_| REPORT_PATH.to_string()),
            run_mode,
            dedup_scope,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got {raw:?}"))),
        None => Ok(default),
    }
}
