use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{self, Config, FETCH_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::RawMatch;

/// Start of the page's embedded data blob.
static PAYLOAD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\s*"props"\s*:"#).expect("payload regex compiles"));

const CONTAINERS_PATH: &str = "/props/pageProps/containers";
const MATCH_CARDS_PATH: &str = "/type/fullWidth/component/contentType/matchCardsList/matchCards";

// ---------------------------------------------------------------------------
// Partial card schema: every field optional, unknown fields ignored
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchCard {
    home_team: Option<TeamCard>,
    away_team: Option<TeamCard>,
    time_period: Option<String>,
    tracking_events: Option<Vec<TrackingEvent>>,
}

#[derive(Debug, Deserialize)]
struct TeamCard {
    name: Option<String>,
    score: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackingEvent {
    typed_server_parameter: Option<ServerParameters>,
}

#[derive(Debug, Deserialize)]
struct ServerParameters {
    competition: Option<TypedValue>,
}

#[derive(Debug, Deserialize)]
struct TypedValue {
    value: Option<String>,
}

impl From<MatchCard> for RawMatch {
    fn from(card: MatchCard) -> Self {
        let (home_team, home_score) = card
            .home_team
            .map(|t| (t.name, t.score))
            .unwrap_or_default();
        let (away_team, away_score) = card
            .away_team
            .map(|t| (t.name, t.score))
            .unwrap_or_default();
        let competition = card
            .tracking_events
            .and_then(|events| events.into_iter().next())
            .and_then(|e| e.typed_server_parameter)
            .and_then(|p| p.competition)
            .and_then(|c| c.value);

        RawMatch {
            home_team,
            home_score,
            away_team,
            away_score,
            time_period: card.time_period,
            competition,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Pulls the live-matches page and turns its embedded blob into raw match records.
pub struct Fetcher {
    client: reqwest::Client,
    url: String,
}

impl Fetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(config::ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: cfg.source_url.clone(),
        })
    }

    /// One snapshot of the live page. Transport failures and a missing blob are
    /// errors; a blob without the expected containers is just zero matches.
    pub async fn fetch_matches(&self) -> Result<Vec<RawMatch>> {
        debug!("GET {}", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let payload = extract_payload(&body)?;
        let matches = match_cards(&payload);
        info!(cards = matches.len(), "Live page fetched: {} match cards", matches.len());
        Ok(matches)
    }
}

/// Locate the `{"props": …}` blob in the page body and parse the first complete
/// JSON value starting there. Anything after it in the page is ignored.
pub fn extract_payload(body: &str) -> Result<Value> {
    let start = PAYLOAD_START
        .find(body)
        .ok_or_else(|| AppError::FormatDrift("embedded \"props\" payload not found".to_string()))?
        .start();

    let mut stream = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
    match stream.next() {
        Some(value) => Ok(value?),
        None => Err(AppError::FormatDrift("embedded payload is empty".to_string())),
    }
}

/// Walk `props.pageProps.containers[*] … matchCardsList.matchCards[*]`.
/// Missing paths yield nothing; cards that don't fit the schema are dropped.
pub fn match_cards(payload: &Value) -> Vec<RawMatch> {
    let Some(containers) = payload.pointer(CONTAINERS_PATH).and_then(Value::as_array) else {
        warn!("Payload has no {CONTAINERS_PATH}; treating as no live matches");
        return Vec::new();
    };

    containers
        .iter()
        .filter_map(|c| c.pointer(MATCH_CARDS_PATH).and_then(Value::as_array))
        .flatten()
        .filter_map(|card| match MatchCard::deserialize(card) {
            Ok(card) => Some(RawMatch::from(card)),
            Err(e) => {
                debug!("Dropping unreadable match card: {e}");
                None
            }
        })
        .collect()
}
