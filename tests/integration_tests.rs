// Integration tests for ticket-watcher
//
// These drive the full poll loop controller against scripted page sources,
// covering the end-to-end scenarios: mixed availability, mid-cycle fetch
// failures, and single-shot runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use ticket_watcher::alert::{AlertDecision, Alerter};
use ticket_watcher::classifier;
use ticket_watcher::fetcher::PageSource;
use ticket_watcher::monitor::{Monitor, MonitorState};
use ticket_watcher::{Availability, AppError, CheckResult, MonitorConfig, PageSnapshot, Result};

struct ScriptedSource {
    outcomes: Mutex<VecDeque<Result<PageSnapshot>>>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(outcomes: Vec<Result<PageSnapshot>>) -> (Self, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcomes: Mutex::new(outcomes.into()),
                fetches: Arc::clone(&fetches),
            },
            fetches,
        )
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, _url: &str) -> Result<PageSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Fetch("script exhausted".to_string())))
    }
}

#[derive(Clone, Default)]
struct RecordingAlerter {
    alerts: Arc<Mutex<Vec<Vec<u32>>>>,
}

#[async_trait]
impl Alerter for RecordingAlerter {
    async fn raise(&self, available: &[CheckResult]) {
        let categories = available.iter().map(|r| r.category).collect();
        self.alerts.lock().unwrap().push(categories);
    }
}

struct AlwaysStop;

#[async_trait]
impl AlertDecision for AlwaysStop {
    async fn continue_after_alert(&mut self, _categories: &[u32]) -> bool {
        false
    }
}

fn config(categories: Vec<u32>, single_shot: bool) -> MonitorConfig {
    MonitorConfig {
        target_url: "https://example.com/listing".to_string(),
        categories,
        interval_secs: 1,
        page_timeout_secs: 5,
        visible: false,
        debug: false,
        single_shot,
        chrome_path: None,
    }
}

#[tokio::test]
async fn mixed_availability_page_triggers_alert_for_the_open_category() {
    // "Unavailable: Category 3. Category 4 tickets: Book Now (active)."
    // categories [3,4] must classify as {3: Unavailable, 4: Available} and
    // the controller must alert on category 4 without blocking on 3.
    let page = "Unavailable: Category 3. Category 4 tickets: Book Now (active).";
    let (source, fetches) = ScriptedSource::new(vec![Ok(PageSnapshot::new(page))]);
    let alerter = RecordingAlerter::default();
    let alerts = Arc::clone(&alerter.alerts);
    let (_tx, rx) = watch::channel(false);

    let mut monitor = Monitor::new(config(vec![3, 4], false), source, alerter, AlwaysStop, rx);
    monitor.run().await;

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(*alerts.lock().unwrap(), vec![vec![4]]);
}

#[tokio::test]
async fn fetch_timeout_downgrades_to_unknown_and_polling_continues() {
    let timeout = AppError::Timeout {
        seconds: 5,
        message: "body never appeared".to_string(),
    };
    let open_page = "Category 3 tickets: Reserve";
    let (source, fetches) = ScriptedSource::new(vec![
        Err(timeout),
        Ok(PageSnapshot::new(open_page)),
    ]);
    let alerter = RecordingAlerter::default();
    let alerts = Arc::clone(&alerter.alerts);
    let (_tx, rx) = watch::channel(false);

    let mut monitor = Monitor::new(config(vec![3, 4], false), source, alerter, AlwaysStop, rx);
    monitor.run().await;

    // The bad cycle was survived and the next one alerted.
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(*alerts.lock().unwrap(), vec![vec![3]]);
}

#[tokio::test]
async fn timeout_cycle_reports_unknown_for_every_requested_category() {
    let timeout = AppError::Timeout {
        seconds: 5,
        message: "body never appeared".to_string(),
    };
    let (source, _) = ScriptedSource::new(vec![Err(timeout)]);
    let (_tx, rx) = watch::channel(false);
    let monitor = Monitor::new(
        config(vec![2, 3, 4], true),
        source,
        RecordingAlerter::default(),
        AlwaysStop,
        rx,
    );

    let results = monitor.check_once().await;

    assert_eq!(results.len(), 3);
    for result in &results {
        assert_eq!(result.status, Availability::Unknown);
        assert!(result.failure.is_some());
    }
    let categories: Vec<u32> = results.iter().map(|r| r.category).collect();
    assert_eq!(categories, vec![2, 3, 4]);
}

#[tokio::test]
async fn single_shot_with_everything_unavailable_stops_after_one_cycle() {
    let page = "Unavailable: Category 3. Unavailable: Category 4.";
    let (source, fetches) = ScriptedSource::new(vec![Ok(PageSnapshot::new(page))]);
    let alerter = RecordingAlerter::default();
    let alerts = Arc::clone(&alerter.alerts);
    let (_tx, rx) = watch::channel(false);

    let mut monitor = Monitor::new(config(vec![3, 4], true), source, alerter, AlwaysStop, rx);
    monitor.run().await;

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_shot_with_available_category_still_stops() {
    let page = "Category 4 tickets: Book Now";
    let (source, fetches) = ScriptedSource::new(vec![Ok(PageSnapshot::new(page))]);
    let alerter = RecordingAlerter::default();
    let alerts = Arc::clone(&alerter.alerts);
    let (_tx, rx) = watch::channel(false);

    let mut monitor = Monitor::new(config(vec![4], true), source, alerter, AlwaysStop, rx);
    monitor.run().await;

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(*alerts.lock().unwrap(), vec![vec![4]]);
}

#[tokio::test]
async fn empty_page_classifies_every_category_as_unknown() {
    let (source, _) = ScriptedSource::new(vec![Ok(PageSnapshot::new(""))]);
    let (_tx, rx) = watch::channel(false);
    let monitor = Monitor::new(
        config(vec![3, 4], true),
        source,
        RecordingAlerter::default(),
        AlwaysStop,
        rx,
    );

    let results = monitor.check_once().await;
    assert!(results
        .iter()
        .all(|r| r.status == Availability::Unknown && r.failure.is_none()));
}

#[test]
fn classifier_matches_the_controller_scenario() {
    let page = "Unavailable: Category 3. Category 4 tickets: Book Now (active).";
    assert_eq!(
        classifier::classify(page, 3).status,
        Availability::Unavailable
    );
    assert_eq!(
        classifier::classify(page, 4).status,
        Availability::Available
    );
}
