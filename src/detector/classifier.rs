use chrono::NaiveDateTime;
use tracing::debug;

use crate::detector::clock::normalize;
use crate::error::RecordError;
use crate::types::{MatchStatus, MinuteWindow, NormalizedTime, QualifyingMatch, RawMatch};

/// A card whose required fields all read cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMatch {
    pub competition: String,
    pub home_team: String,
    pub home_score: u32,
    pub away_team: String,
    pub away_score: u32,
    pub time: NormalizedTime,
}

impl ParsedMatch {
    pub fn is_scoreless(&self) -> bool {
        self.home_score == 0 && self.away_score == 0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifyStats {
    pub total: usize,
    pub skipped: usize,
    pub rejected_score: usize,
    pub rejected_window: usize,
    pub qualified: usize,
}

/// Read one card. Failures are returned, not raised, so the caller decides to skip.
pub fn parse_record(raw: &RawMatch, max_minutes: u32) -> Result<ParsedMatch, RecordError> {
    let home_team = required_name(raw.home_team.as_deref()).ok_or(RecordError::MissingHomeTeam)?;
    let away_team = required_name(raw.away_team.as_deref()).ok_or(RecordError::MissingAwayTeam)?;
    let home_score = parse_score(raw.home_score.as_deref())?;
    let away_score = parse_score(raw.away_score.as_deref())?;
    let competition = raw
        .competition
        .clone()
        .ok_or(RecordError::MissingCompetition)?;

    Ok(ParsedMatch {
        competition,
        home_team,
        home_score,
        away_team,
        away_score,
        time: normalize(raw.time_period.as_deref(), max_minutes),
    })
}

/// Score text is "<n>" optionally followed by more tokens; empty or absent is 0.
pub fn parse_score(raw: Option<&str>) -> Result<u32, RecordError> {
    match raw.and_then(|s| s.split_whitespace().next()) {
        None => Ok(0),
        Some(token) => token
            .parse::<u32>()
            .map_err(|_| RecordError::BadScore(token.to_string())),
    }
}

fn required_name(name: Option<&str>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty()).map(str::to_string)
}

/// Keep the 0×0 matches inside `window`, in input order.
pub fn classify(
    matches: &[RawMatch],
    window: &MinuteWindow,
    captured_at: NaiveDateTime,
) -> Vec<QualifyingMatch> {
    classify_with_stats(matches, window, captured_at).0
}

pub fn classify_with_stats(
    matches: &[RawMatch],
    window: &MinuteWindow,
    captured_at: NaiveDateTime,
) -> (Vec<QualifyingMatch>, ClassifyStats) {
    let mut stats = ClassifyStats {
        total: matches.len(),
        ..Default::default()
    };

    let mut qualifying = Vec::new();
    for raw in matches {
        let m = match parse_record(raw, window.cap) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("skipping match card: {e}");
                stats.skipped += 1;
                continue;
            }
        };
        if !m.is_scoreless() {
            stats.rejected_score += 1;
            continue;
        }
        if !window.contains(m.time.minutes) {
            stats.rejected_window += 1;
            continue;
        }
        qualifying.push(QualifyingMatch {
            status: MatchStatus::from_minutes(m.time.minutes),
            competition: m.competition,
            home_team: m.home_team,
            home_score: m.home_score,
            away_team: m.away_team,
            away_score: m.away_score,
            time: m.time,
            captured_at,
        });
    }

    stats.qualified = qualifying.len();
    (qualifying, stats)
}
