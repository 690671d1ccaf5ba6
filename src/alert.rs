use async_trait::async_trait;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::CheckResult;
use crate::utils::error::{AppError, Result};

/// Raises the user-facing alert when tickets turn up. Behind a trait so the
/// poll loop can be driven in tests without beeping or opening browsers.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn raise(&self, available: &[CheckResult]);
}

/// Decides whether polling continues after an alert has fired.
///
/// Injected into the poll loop instead of prompting inline, so the loop
/// itself stays free of interactive I/O.
#[async_trait]
pub trait AlertDecision: Send {
    async fn continue_after_alert(&mut self, categories: &[u32]) -> bool;
}

/// Plays the two-tone notification and opens the booking page. Both steps
/// are best-effort: a missing audio device or browser is logged, never fatal.
pub struct AlertDispatcher {
    booking_url: String,
}

impl AlertDispatcher {
    pub fn new(booking_url: impl Into<String>) -> Self {
        Self {
            booking_url: booking_url.into(),
        }
    }
}

#[async_trait]
impl Alerter for AlertDispatcher {
    async fn raise(&self, available: &[CheckResult]) {
        let categories: Vec<u32> = available.iter().map(|r| r.category).collect();
        info!(
            "Tickets available in categories: {}!",
            category_list(&categories)
        );

        // The beep blocks for its full duration, so it runs on the blocking
        // pool instead of a runtime worker.
        match tokio::task::spawn_blocking(play_notification).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("could not play notification sound: {e}");
                terminal_bell();
            }
            Err(e) => warn!("notification sound task failed: {e}"),
        }

        if let Err(e) = webbrowser::open(&self.booking_url) {
            warn!("could not open booking page: {e}");
        }
    }
}

/// Interactive continue-or-stop: Enter keeps polling, EOF or a read failure
/// stops.
pub struct PromptDecision;

#[async_trait]
impl AlertDecision for PromptDecision {
    async fn continue_after_alert(&mut self, categories: &[u32]) -> bool {
        println!(
            "Tickets found in categories {}! Press Enter to continue checking, or Ctrl+C to exit...",
            category_list(categories)
        );

        // stdin has no async story worth having here; park the read on the
        // blocking pool.
        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)
        })
        .await;

        match read {
            Ok(Ok(0)) => false, // EOF, nobody at the terminal
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("could not read from stdin: {e}");
                false
            }
            Err(e) => {
                warn!("stdin task failed: {e}");
                false
            }
        }
    }
}

/// Two ascending beeps, one second each, matching the original alert tone.
fn play_notification() -> Result<()> {
    let (_stream, handle) =
        OutputStream::try_default().map_err(|e| AppError::Alert(e.to_string()))?;
    let sink = Sink::try_new(&handle).map_err(|e| AppError::Alert(e.to_string()))?;

    for freq in [1000.0_f32, 1200.0] {
        let tone = SineWave::new(freq)
            .take_duration(Duration::from_secs(1))
            .amplify(0.20);
        sink.append(tone);
    }
    sink.sleep_until_end();
    Ok(())
}

/// ASCII bell fallback when no audio device is usable.
fn terminal_bell() {
    print!("\x07");
    let _ = std::io::stdout().flush();
}

fn category_list(categories: &[u32]) -> String {
    categories
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_list_formatting() {
        assert_eq!(category_list(&[4]), "4");
        assert_eq!(category_list(&[3, 4, 7]), "3, 4, 7");
        assert_eq!(category_list(&[]), "");
    }

    #[test]
    fn test_dispatcher_holds_booking_url() {
        let dispatcher = AlertDispatcher::new("https://example.com/book");
        assert_eq!(dispatcher.booking_url, "https://example.com/book");
    }
}
