use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, TELEGRAM_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::QualifyingMatch;

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    chat_id: String,
}

/// Sends one Telegram message per newly scoreless match.
/// Without a bot token it only logs what it would have sent.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    credentials: Option<Credentials>,
}

impl TelegramNotifier {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()?;

        let credentials = match (&cfg.telegram_token, &cfg.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some(Credentials {
                token: token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => {
                warn!("TELEGRAM_BOT_TOKEN not set, alerts will only be logged");
                None
            }
        };

        Ok(Self {
            client,
            api_url: cfg.telegram_api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn send(&self, m: &QualifyingMatch) -> Result<()> {
        let text = alert_text(m);
        let Some(creds) = &self.credentials else {
            info!(key = %m.key(), "ALERT (not sent) | {}", text.replace('\n', " "));
            return Ok(());
        };

        // The token is part of the path, so keep the URL out of any error we log.
        let url = format!("{}/bot{}/sendMessage", self.api_url, creds.token);
        let resp = self
            .client
            .post(&url)
            .query(&[
                ("chat_id", creds.chat_id.as_str()),
                ("text", text.as_str()),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Telegram {
                status: status.as_u16(),
                body,
            });
        }

        debug!(key = %m.key(), "Telegram alert delivered");
        Ok(())
    }
}

/// The chat message body. Team and competition names are HTML-escaped because
/// the message is sent with `parse_mode=HTML`.
pub fn alert_text(m: &QualifyingMatch) -> String {
    format!(
        "⚽ ALERTA 0x0 ⚽\n\n🏆 {}\n⏱️ {}\n\n{} {} × {} {}",
        escape_html(&m.competition),
        escape_html(&m.time.display),
        escape_html(&m.home_team),
        m.home_score,
        m.away_score,
        escape_html(&m.away_team),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
