use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Raw match: one card as read from the live page, fields still textual
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub home_team: Option<String>,
    /// First whitespace-delimited token is the score; empty or absent means 0.
    pub home_score: Option<String>,
    pub away_team: Option<String>,
    pub away_score: Option<String>,
    pub time_period: Option<String>,
    pub competition: Option<String>,
}

// ---------------------------------------------------------------------------
// Elapsed time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTime {
    /// Always within 0..=MAX_MINUTES.
    pub minutes: u32,
    /// "45'", "90+2'", or the untouched sentinel when the clock is stopped.
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    PreGame,
    InProgress,
}

impl MatchStatus {
    pub fn from_minutes(minutes: u32) -> Self {
        if minutes == 0 {
            MatchStatus::PreGame
        } else {
            MatchStatus::InProgress
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::PreGame => "Pré-Jogo",
            MatchStatus::InProgress => "Em Andamento",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Qualifying match: scoreless and inside the window, valid for one cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingMatch {
    pub competition: String,
    pub home_team: String,
    pub home_score: u32,
    pub away_team: String,
    pub away_score: u32,
    pub time: NormalizedTime,
    pub status: MatchStatus,
    pub captured_at: NaiveDateTime,
}

impl QualifyingMatch {
    pub fn key(&self) -> MatchKey {
        MatchKey::new(&self.home_team, &self.away_team)
    }

    pub fn capture_date(&self) -> String {
        self.captured_at.format("%d/%m/%Y").to_string()
    }

    pub fn capture_time(&self) -> String {
        self.captured_at.format("%H:%M:%S").to_string()
    }
}

/// Identity of an ongoing match across cycles: home name followed by away name,
/// exact and case-sensitive. Competition is deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn new(home_team: &str, away_team: &str) -> Self {
        Self(format!("{home_team}{away_team}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Scoreless window
// ---------------------------------------------------------------------------

/// Inclusive minute range a 0×0 match must fall in. `max: None` is the
/// open-ended policy, bounded only by the normalizer cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteWindow {
    pub min: u32,
    pub max: Option<u32>,
    pub cap: u32,
}

impl MinuteWindow {
    pub fn new(min: u32, max: Option<u32>, cap: u32) -> Result<Self> {
        if min > cap {
            return Err(AppError::Config(format!(
                "MIN_MINUTES ({min}) exceeds MAX_MINUTES ({cap})"
            )));
        }
        if let Some(upper) = max {
            if upper < min {
                return Err(AppError::Config(format!(
                    "WINDOW_MAX_MINUTES ({upper}) is below MIN_MINUTES ({min})"
                )));
            }
        }
        Ok(Self { min, max, cap })
    }

    pub fn at_least(min: u32, cap: u32) -> Self {
        Self { min, max: None, cap }
    }

    pub fn between(min: u32, max: u32, cap: u32) -> Self {
        Self { min, max: Some(max), cap }
    }

    pub fn upper(&self) -> u32 {
        self.max.map_or(self.cap, |m| m.min(self.cap))
    }

    pub fn contains(&self, minutes: u32) -> bool {
        minutes >= self.min && minutes <= self.upper()
    }
}

impl std::fmt::Display for MinuteWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{} min", self.min, max),
            None => write!(f, ">={} min", self.min),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution knobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Poll forever until interrupted.
    Loop,
    /// One cycle; fetch or report failure ends the process with code 1.
    Once,
}

impl std::str::FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "loop" => Ok(RunMode::Loop),
            "once" => Ok(RunMode::Once),
            other => Err(AppError::Config(format!(
                "RUN_MODE must be 'loop' or 'once', got {other:?}"
            ))),
        }
    }
}

/// How long an alerted match stays suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupScope {
    /// Alert once per (home, away) pair for the life of the process.
    Process,
    /// Forget alerts after every cycle, so every qualifying match is re-sent.
    Cycle,
}

impl std::str::FromStr for DedupScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "process" => Ok(DedupScope::Process),
            "cycle" => Ok(DedupScope::Cycle),
            other => Err(AppError::Config(format!(
                "DEDUP_SCOPE must be 'process' or 'cycle', got {other:?}"
            ))),
        }
    }
}
