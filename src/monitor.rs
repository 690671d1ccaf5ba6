use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::alert::{AlertDecision, Alerter};
use crate::classifier;
use crate::config::MonitorConfig;
use crate::fetcher::PageSource;
use crate::models::{Availability, CheckResult};

/// Poll loop states: Idle -> Checking -> {Alerting, Sleeping} -> ... -> Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Checking,
    Alerting,
    Sleeping,
    Stopped,
}

/// Drives repeated fetch -> classify -> (alert | sleep) cycles.
///
/// The page source, alerter and post-alert decision are all injected, so the
/// loop logic is testable without Chrome, audio or a terminal.
pub struct Monitor<S, A, D>
where
    S: PageSource,
    A: Alerter,
    D: AlertDecision,
{
    config: MonitorConfig,
    source: S,
    alerter: A,
    decision: D,
    shutdown: watch::Receiver<bool>,
    state: MonitorState,
}

impl<S, A, D> Monitor<S, A, D>
where
    S: PageSource,
    A: Alerter,
    D: AlertDecision,
{
    pub fn new(
        config: MonitorConfig,
        source: S,
        alerter: A,
        decision: D,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            source,
            alerter,
            decision,
            shutdown,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// One Checking pass: fetch the page once, classify every configured
    /// category in ascending order. A fetch or timeout failure is downgraded
    /// to one Unknown result per category; the loop never dies on a bad cycle.
    pub async fn check_once(&self) -> Vec<CheckResult> {
        info!(
            "Checking availability for categories {:?}...",
            self.config.categories
        );

        let snapshot = match self.source.fetch(&self.config.target_url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error checking tickets: {e}");
                return self
                    .config
                    .categories
                    .iter()
                    .map(|&category| {
                        let result = CheckResult::failed(category, &e);
                        self.log_result(&result);
                        result
                    })
                    .collect();
            }
        };

        self.config
            .categories
            .iter()
            .map(|&category| {
                let classification = classifier::classify(&snapshot.raw_text, category);
                let result = CheckResult::classified(category, classification);
                self.log_result(&result);
                result
            })
            .collect()
    }

    fn log_result(&self, result: &CheckResult) {
        match result.status {
            Availability::Available => {
                info!(
                    category = result.category,
                    evidence = result.evidence.as_deref().unwrap_or(""),
                    "Category {} tickets available for booking!",
                    result.category
                );
            }
            Availability::Unavailable => {
                info!(
                    category = result.category,
                    "No Category {} tickets available at this time.",
                    result.category
                );
            }
            Availability::Unknown => match &result.failure {
                Some(cause) => {
                    warn!(
                        category = result.category,
                        "Category {} status unknown this cycle: {}", result.category, cause
                    );
                }
                None => {
                    info!(
                        category = result.category,
                        "Category {} not found on the page.",
                        result.category
                    );
                }
            },
        }
    }

    /// Run until stopped. Returns once the state machine reaches Stopped,
    /// whether by single-shot completion, a post-alert stop decision, or the
    /// external shutdown signal.
    pub async fn run(&mut self) {
        info!(
            "Starting to check for categories {:?} every {}s. Press Ctrl+C to stop.",
            self.config.categories, self.config.interval_secs
        );
        if self.config.single_shot {
            info!("Running in single-shot mode - will perform one check and exit");
        }

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.transition(MonitorState::Checking);
            let results = self.check_once().await;

            let available: Vec<CheckResult> =
                results.into_iter().filter(|r| r.is_available()).collect();

            if !available.is_empty() {
                self.transition(MonitorState::Alerting);
                self.alerter.raise(&available).await;

                let categories: Vec<u32> = available.iter().map(|r| r.category).collect();
                if self.config.single_shot
                    || !self.decision.continue_after_alert(&categories).await
                {
                    break;
                }
            } else if self.config.single_shot {
                info!("No tickets available in any of the selected categories.");
                break;
            }

            if self.config.single_shot {
                break;
            }

            self.transition(MonitorState::Sleeping);
            debug!("Waiting {}s before next check...", self.config.interval_secs);
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {}
                _ = shutdown_signalled(&mut self.shutdown) => break,
            }
        }

        self.transition(MonitorState::Stopped);
        info!("Monitor stopped");
    }

    fn transition(&mut self, next: MonitorState) {
        debug!("state transition: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Resolves once the shutdown flag flips to true (or the sender side is
/// gone, at which point nobody is left to keep us running).
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
