use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::detector::classify_with_stats;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::notifier::TelegramNotifier;
use crate::report::{ReportOutcome, ReportWriter};
use crate::state::NotifiedSet;
use crate::types::{MinuteWindow, QualifyingMatch, RawMatch, RunMode};

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

pub trait MatchSource {
    async fn fetch(&self) -> Result<Vec<RawMatch>>;
}

pub trait Notifier {
    async fn notify(&self, m: &QualifyingMatch) -> Result<()>;
}

pub trait ReportSink {
    async fn write_report(&self, matches: &[QualifyingMatch]) -> Result<ReportOutcome>;
}

impl MatchSource for Fetcher {
    async fn fetch(&self) -> Result<Vec<RawMatch>> {
        self.fetch_matches().await
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, m: &QualifyingMatch) -> Result<()> {
        self.send(m).await
    }
}

impl ReportSink for ReportWriter {
    async fn write_report(&self, matches: &[QualifyingMatch]) -> Result<ReportOutcome> {
        self.write(matches).await
    }
}

// ---------------------------------------------------------------------------
// Cycle result
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub fetch_failed: bool,
    pub skipped: usize,
    pub qualifying: usize,
    pub notified: usize,
    pub notify_failures: usize,
    /// None when the report write failed.
    pub report: Option<ReportOutcome>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Drives fetch → classify → notify → report, either once or on a fixed interval.
///
/// One cycle always runs to completion; shutdown is only observed between
/// cycles, so a report write is never cut short.
pub struct Scanner<S, N, R> {
    source: S,
    notifier: N,
    report: R,
    window: MinuteWindow,
    notified: NotifiedSet,
    poll_interval: Duration,
    show_limit: usize,
}

impl<S: MatchSource, N: Notifier, R: ReportSink> Scanner<S, N, R> {
    pub fn new(cfg: &Config, source: S, notifier: N, report: R) -> Self {
        Self {
            source,
            notifier,
            report,
            window: cfg.window,
            notified: NotifiedSet::new(cfg.dedup_scope),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            show_limit: cfg.show_limit,
        }
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Poll until `shutdown` flips to true (or its sender goes away).
    pub async fn run_loop(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            window = %self.window,
            interval_secs = self.poll_interval.as_secs(),
            "Scanner loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            info!("Next check in {} min", self.poll_interval.as_secs() / 60);
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Scanner stopped");
    }

    /// One cycle where transport, format and report failures are logged and swallowed.
    pub async fn run_cycle(&mut self) -> CycleSummary {
        match self.cycle(RunMode::Loop).await {
            Ok(summary) => summary,
            Err(e) => {
                // Loop mode never propagates; reaching this means a seam broke that contract.
                error!("Cycle aborted: {e}");
                CycleSummary::default()
            }
        }
    }

    /// One cycle where a failed fetch or failed report write is returned as an error.
    pub async fn run_once(&mut self) -> Result<CycleSummary> {
        self.cycle(RunMode::Once).await
    }

    async fn cycle(&mut self, mode: RunMode) -> Result<CycleSummary> {
        let mut summary = CycleSummary::default();

        // FETCHING
        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(e) if mode == RunMode::Loop => {
                warn!("Fetch failed, continuing with no matches: {e}");
                summary.fetch_failed = true;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        summary.fetched = raw.len();

        // CLASSIFYING
        let captured_at = chrono::Local::now().naive_local();
        let (qualifying, stats) = classify_with_stats(&raw, &self.window, captured_at);
        summary.skipped = stats.skipped;
        summary.qualifying = qualifying.len();

        // NOTIFYING
        let fresh = self.notified.dedupe(&qualifying);
        for m in &fresh {
            match self.notifier.notify(m).await {
                Ok(()) => summary.notified += 1,
                Err(e) => {
                    summary.notify_failures += 1;
                    warn!(key = %m.key(), "Alert failed: {e}");
                }
            }
        }
        self.notified.end_cycle();

        info!(
            fetched = stats.total,
            skipped = stats.skipped,
            rejected_score = stats.rejected_score,
            rejected_window = stats.rejected_window,
            qualifying = summary.qualifying,
            notified = summary.notified,
            "Qualifying matches: {}",
            summary.qualifying
        );
        for (i, m) in qualifying.iter().take(self.show_limit).enumerate() {
            info!(
                "{}. {} {}×{} {} | {}",
                i + 1,
                m.home_team,
                m.home_score,
                m.away_score,
                m.away_team,
                m.time.display
            );
        }

        // REPORTING
        summary.report = match self.report.write_report(&qualifying).await {
            Ok(outcome) => Some(outcome),
            Err(e) if mode == RunMode::Loop => {
                error!("Report generation failed: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::types::DedupScope;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // --- fakes -------------------------------------------------------------

    struct ScriptedSource {
        cycles: Mutex<VecDeque<Result<Vec<RawMatch>>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(cycles: Vec<Result<Vec<RawMatch>>>) -> Self {
            Self {
                cycles: Mutex::new(cycles.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl MatchSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<RawMatch>> {
            *self.calls.lock().unwrap() += 1;
            self.cycles.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, m: &QualifyingMatch) -> Result<()> {
            if self.fail_for.as_deref() == Some(m.home_team.as_str()) {
                return Err(AppError::Telegram {
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            self.sent.lock().unwrap().push(m.key().to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryReport {
        fail: bool,
        writes: Mutex<Vec<usize>>,
    }

    impl ReportSink for MemoryReport {
        async fn write_report(&self, matches: &[QualifyingMatch]) -> Result<ReportOutcome> {
            if self.fail {
                return Err(AppError::Io(std::io::Error::other("disk full")));
            }
            self.writes.lock().unwrap().push(matches.len());
            Ok(if matches.is_empty() {
                ReportOutcome::Skipped
            } else {
                ReportOutcome::Written(matches.len())
            })
        }
    }

    // --- helpers -----------------------------------------------------------

    fn cfg() -> Config {
        Config {
            source_url: "http://localhost/live".to_string(),
            log_level: "info".to_string(),
            telegram_token: None,
            telegram_chat_id: None,
            telegram_api_url: "http://localhost".to_string(),
            max_minutes: 120,
            window: MinuteWindow::at_least(20, 120),
            poll_interval_secs: 3600,
            show_limit: 10,
            report_path: "unused.xlsx".to_string(),
            run_mode: RunMode::Loop,
            dedup_scope: DedupScope::Process,
        }
    }

    fn raw(home: &str, away: &str, hs: &str, aws: &str, time: &str) -> RawMatch {
        RawMatch {
            home_team: Some(home.to_string()),
            home_score: Some(hs.to_string()),
            away_team: Some(away.to_string()),
            away_score: Some(aws.to_string()),
            time_period: Some(time.to_string()),
            competition: Some("Liga".to_string()),
        }
    }

    fn transport_error() -> AppError {
        AppError::FormatDrift("page changed".to_string())
    }

    // --- tests -------------------------------------------------------------

    #[tokio::test]
    async fn same_match_alerts_only_once() {
        let source = ScriptedSource::new(vec![
            Ok(vec![raw("A", "B", "0", "0", "25'")]),
            Ok(vec![raw("A", "B", "0", "0", "40'")]),
        ]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());

        let first = scanner.run_cycle().await;
        let second = scanner.run_cycle().await;

        assert_eq!(first.notified, 1);
        assert_eq!(second.notified, 0);
        assert_eq!(second.qualifying, 1);
        assert_eq!(*scanner.notifier.sent.lock().unwrap(), vec!["AB".to_string()]);
        assert_eq!(*scanner.report.writes.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn cycle_scope_realerts_every_cycle() {
        let mut config = cfg();
        config.dedup_scope = DedupScope::Cycle;
        let source = ScriptedSource::new(vec![
            Ok(vec![raw("A", "B", "0", "0", "25'")]),
            Ok(vec![raw("A", "B", "0", "0", "26'")]),
        ]);
        let mut scanner = Scanner::new(&config, source, RecordingNotifier::default(), MemoryReport::default());

        scanner.run_cycle().await;
        scanner.run_cycle().await;
        assert_eq!(scanner.notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_in_loop_mode_yields_empty_cycle() {
        let source = ScriptedSource::new(vec![Err(transport_error())]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());

        let summary = scanner.run_cycle().await;
        assert!(summary.fetch_failed);
        assert_eq!(summary.fetched, 0);
        assert_eq!(summary.notified, 0);
        assert_eq!(summary.report, Some(ReportOutcome::Skipped));
    }

    #[tokio::test]
    async fn fetch_failure_in_once_mode_is_an_error() {
        let source = ScriptedSource::new(vec![Err(transport_error())]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());
        assert!(scanner.run_once().await.is_err());
    }

    #[tokio::test]
    async fn report_failure_is_swallowed_in_loop_and_raised_once() {
        let failing = || MemoryReport {
            fail: true,
            ..Default::default()
        };
        let batch = || Ok(vec![raw("A", "B", "0", "0", "30'")]);

        let mut looping = Scanner::new(&cfg(), ScriptedSource::new(vec![batch()]), RecordingNotifier::default(), failing());
        let summary = looping.run_cycle().await;
        assert_eq!(summary.report, None);
        assert_eq!(summary.notified, 1);

        let mut once = Scanner::new(&cfg(), ScriptedSource::new(vec![batch()]), RecordingNotifier::default(), failing());
        assert!(once.run_once().await.is_err());
    }

    #[tokio::test]
    async fn one_failed_alert_does_not_block_the_rest() {
        let notifier = RecordingNotifier {
            fail_for: Some("A".to_string()),
            ..Default::default()
        };
        let source = ScriptedSource::new(vec![Ok(vec![
            raw("A", "B", "0", "0", "30'"),
            raw("C", "D", "0", "0", "31'"),
        ])]);
        let mut scanner = Scanner::new(&cfg(), source, notifier, MemoryReport::default());

        let summary = scanner.run_cycle().await;
        assert_eq!(summary.notify_failures, 1);
        assert_eq!(summary.notified, 1);
        assert_eq!(*scanner.notifier.sent.lock().unwrap(), vec!["CD".to_string()]);
        assert_eq!(summary.report, Some(ReportOutcome::Written(2)));
    }

    #[tokio::test]
    async fn end_to_end_three_matches() {
        let source = ScriptedSource::new(vec![Ok(vec![
            raw("TeamA", "TeamB", "0", "0", "32'"),
            raw("TeamC", "TeamD", "1", "0", "50'"),
            raw("TeamE", "TeamF", "0", "0", "5'"),
        ])]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());

        let summary = scanner.run_once().await.unwrap();
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.qualifying, 1);
        assert_eq!(*scanner.notifier.sent.lock().unwrap(), vec!["TeamATeamB".to_string()]);
        assert!(scanner.notified().contains(&crate::types::MatchKey::new("TeamA", "TeamB")));
    }

    #[tokio::test]
    async fn loop_exits_when_already_shut_down() {
        let (tx, rx) = watch::channel(true);
        let source = ScriptedSource::new(vec![]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());

        scanner.run_loop(rx).await;
        assert_eq!(scanner.source.calls(), 0);
        drop(tx);
    }

    #[tokio::test]
    async fn loop_stops_during_wait() {
        let (tx, rx) = watch::channel(false);
        let source = ScriptedSource::new(vec![Ok(vec![raw("A", "B", "0", "0", "30'")])]);
        let mut scanner = Scanner::new(&cfg(), source, RecordingNotifier::default(), MemoryReport::default());

        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        let run = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(scanner.run_loop(rx), stop);
        });
        run.await.expect("loop should stop on shutdown");

        assert_eq!(scanner.source.calls(), 1);
        assert_eq!(scanner.notified().len(), 1);
    }
}
