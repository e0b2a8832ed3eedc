//! Live-log ingestion: feeds streamed remote log events into the job store.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError, LogStream};
use crate::config::SettingsStore;
use crate::jobs::{JobStore, LogStreamEvent, NewLogEntry};

/// Bridges the remote log stream into the job store.
///
/// While active, holds exactly one open streaming connection and reconnects
/// with capped backoff when it drops, re-checking the live-log flag before
/// each attempt. Closing (or dropping) the bridge aborts the connection
/// deterministically; it is never leaked across mounts.
pub struct LogStreamBridge {
    handle: Option<JoinHandle<()>>,
}

impl LogStreamBridge {
    /// Starts the bridge. Inert when live logs are disabled at start time.
    pub fn start(api: ApiClient, store: Arc<JobStore>, settings: Arc<SettingsStore>) -> Self {
        if !settings.current().enable_live_logs {
            log::debug!("Live logs disabled, log stream bridge not started");
            return Self { handle: None };
        }
        Self {
            handle: Some(tokio::spawn(run(api, store, settings))),
        }
    }

    /// True while the bridge task is running.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Closes the streaming connection.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for LogStreamBridge {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(api: ApiClient, store: Arc<JobStore>, settings: Arc<SettingsStore>) {
    let mut attempt: u32 = 0;
    loop {
        if !settings.current().enable_live_logs {
            log::info!("Live logs disabled, stopping log stream bridge");
            return;
        }

        match api.open_log_stream().await {
            Ok(mut stream) => {
                attempt = 0;
                if let Err(e) = consume(&mut stream, &store).await {
                    log::warn!("Log stream interrupted: {}", e);
                } else {
                    log::info!("Log stream closed by server");
                }
            }
            Err(e) => log::warn!("Failed to open log stream: {}", e),
        }

        let delay = crate::api::retry::backoff_delay(attempt);
        attempt = attempt.saturating_add(1);
        tokio::time::sleep(delay).await;
    }
}

/// Drains `stream` into the store. Malformed payloads are logged and
/// dropped; they never tear the stream down.
async fn consume(stream: &mut LogStream, store: &JobStore) -> Result<(), ApiError> {
    while let Some(payload) = stream.next_event().await? {
        match serde_json::from_str::<LogStreamEvent>(&payload) {
            Ok(event) => {
                store.append_log(
                    &event.job_id,
                    NewLogEntry {
                        timestamp: event.timestamp,
                        level: event.level,
                        message: event.message,
                    },
                );
            }
            Err(e) => log::warn!("Dropping malformed log event: {} ({})", e, payload),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsPatch;
    use crate::jobs::LogLevel;

    fn stream_from(body: &'static str) -> LogStream {
        LogStream::new(reqwest::Response::from(
            http::Response::builder()
                .status(200)
                .header("content-type", "text/event-stream")
                .body(body)
                .unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_consume_appends_events_and_drops_malformed() {
        let store = JobStore::new();
        let mut stream = stream_from(
            "data: {\"jobId\":\"job-1\",\"level\":\"info\",\"message\":\"started\",\"timestamp\":\"2026-03-01T10:00:00Z\"}\n\n\
             data: not json\n\n\
             data: {\"jobId\":\"job-1\",\"level\":\"error\",\"message\":\"upstream 401\",\"timestamp\":\"2026-03-01T10:00:05Z\"}\n\n",
        );

        consume(&mut stream, &store).await.unwrap();

        let logs = store.logs("job-1");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "started");
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[1].message, "upstream 401");
        assert_eq!(logs[1].level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_bridge_is_inert_when_live_logs_disabled() {
        let settings = Arc::new(SettingsStore::new());
        settings.update(SettingsPatch {
            enable_live_logs: Some(false),
            ..Default::default()
        });
        let api = ApiClient::new(Arc::clone(&settings)).unwrap();

        let bridge = LogStreamBridge::start(api, Arc::new(JobStore::new()), settings);
        assert!(!bridge.is_active());
    }

    #[tokio::test]
    async fn test_close_stops_the_bridge() {
        let settings = Arc::new(SettingsStore::new());
        settings.update(SettingsPatch {
            // Nothing listens here; the bridge will sit in its backoff loop.
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            enable_live_logs: Some(true),
            ..Default::default()
        });
        let api = ApiClient::new(Arc::clone(&settings)).unwrap();

        let mut bridge = LogStreamBridge::start(api, Arc::new(JobStore::new()), settings);
        assert!(bridge.is_active());

        bridge.close();
        tokio::task::yield_now().await;
        assert!(!bridge.is_active());
    }
}
