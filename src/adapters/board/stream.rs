//! SSE stream ingestion from the board's live event feed (spec §4.6).
//!
//! Reconnects with exponential backoff (1s, doubling, capped at 60s, reset
//! to 1s after any successfully parsed frame) and forwards decoded frames
//! on an mpsc channel for the orchestrator's inbound-sync phase to drain.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardStreamFrame {
    pub event: String,
    pub data: Value,
}

pub struct StreamIngestor {
    http: HttpClient,
    stop: CancellationToken,
}

impl StreamIngestor {
    #[must_use]
    pub fn new() -> Self {
        Self { http: HttpClient::new(), stop: CancellationToken::new() }
    }

    /// Signals the running stream loop to stop after its current attempt.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Runs the reconnect loop until `stop()` is called, pushing each
    /// decoded frame onto `tx`. Returns when cancelled; never returns an
    /// error to the caller (connection failures are retried internally).
    pub async fn run(&self, board_id: &str, sse_url: &str, tx: mpsc::Sender<BoardStreamFrame>) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            if self.stop.is_cancelled() {
                return;
            }

            tracing::info!(board_id, sse_url, "connecting to board event stream");

            match self.consume_once(sse_url, &tx).await {
                Ok(()) => {
                    backoff = INITIAL_BACKOFF;
                }
                Err(e) => {
                    tracing::warn!(board_id, error = %e, backoff_secs = backoff.as_secs(), "board stream disconnected");
                }
            }

            if self.stop.is_cancelled() {
                return;
            }

            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = self.stop.cancelled() => return,
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn consume_once(&self, sse_url: &str, tx: &mpsc::Sender<BoardStreamFrame>) -> Result<(), String> {
        let resp = self
            .http
            .get(sse_url)
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(format!("stream endpoint returned {}", resp.status()));
        }

        let mut byte_stream = resp.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = byte_stream.next().await {
            if self.stop.is_cancelled() {
                return Ok(());
            }
            let chunk = chunk.map_err(|e| e.to_string())?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find("\n\n") {
                let frame_text = buffer[..pos].to_string();
                buffer.drain(..pos + 2);
                if let Some(frame) = parse_sse_frame(&frame_text) {
                    if tx.send(frame).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }

        Err("stream ended".to_string())
    }
}

impl Default for StreamIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one `event:`/`data:` SSE frame, falling back to `{"raw": ...}`
/// when the data line isn't valid JSON (mirrors the board's tolerant
/// producer behavior).
fn parse_sse_frame(text: &str) -> Option<BoardStreamFrame> {
    let mut event = "message".to_string();
    let mut data_lines = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim().to_string());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    let raw = data_lines.join("\n");
    let data = serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }));

    Some(BoardStreamFrame { event, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_data_frame() {
        let frame = parse_sse_frame("event: task_updated\ndata: {\"id\":\"t1\"}").unwrap();
        assert_eq!(frame.event, "task_updated");
        assert_eq!(frame.data["id"], "t1");
    }

    #[test]
    fn falls_back_to_raw_on_non_json_data() {
        let frame = parse_sse_frame("event: note\ndata: not json at all").unwrap();
        assert_eq!(frame.data["raw"], "not json at all");
    }

    #[test]
    fn defaults_event_name_to_message() {
        let frame = parse_sse_frame("data: {}").unwrap();
        assert_eq!(frame.event, "message");
    }

    #[test]
    fn returns_none_without_data_line() {
        assert!(parse_sse_frame("event: ping").is_none());
    }

    #[tokio::test]
    async fn reconnects_after_the_server_drops_the_connection() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let body = "event: task_updated\ndata: {\"id\":\"t1\"}\n\nevent: task_updated\ndata: {\"id\":\"t2\"}\n\n";
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let ingestor = std::sync::Arc::new(StreamIngestor::new());
        let (tx, mut rx) = mpsc::channel(8);
        let sse_url = format!("{}/stream", server.uri());
        let handle = ingestor.clone();
        let task = tokio::spawn(async move { handle.run("board-1", &sse_url, tx).await });

        let first = rx.recv().await.expect("first frame delivered");
        let second = rx.recv().await.expect("second frame delivered");
        assert_eq!(first.data["id"], "t1");
        assert_eq!(second.data["id"], "t2");

        // The fixed-length body ends after two frames, so the consumer sees
        // the connection drop and re-enters the backoff/reconnect loop;
        // `stop()` should make it exit before the next attempt completes.
        ingestor.stop();
        tokio::time::timeout(Duration::from_secs(5), task).await.expect("run() exits after stop()").unwrap();
    }

    #[tokio::test]
    async fn recovers_after_a_failed_connection_attempt() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string("event: ping\ndata: {}\n\n"))
            .mount(&server)
            .await;

        let ingestor = std::sync::Arc::new(StreamIngestor::new());
        let (tx, mut rx) = mpsc::channel(8);
        let sse_url = format!("{}/stream", server.uri());
        let handle = ingestor.clone();
        let task = tokio::spawn(async move { handle.run("board-1", &sse_url, tx).await });

        let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("frame eventually delivered after reconnect")
            .expect("channel open");
        assert_eq!(frame.event, "ping");

        ingestor.stop();
        tokio::time::timeout(Duration::from_secs(5), task).await.expect("run() exits after stop()").unwrap();
    }
}
