// Live position stream - WebSocket client with backoff reconnect
use crate::application::tracker::PositionUpdate;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Position(PositionUpdate),
    Disconnected,
}

#[derive(Debug, Deserialize)]
struct WirePositionEvent {
    #[serde(rename = "type")]
    kind: String,
    device_id: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    ts: Option<DateTime<Utc>>,
}

/// Only `type == "position"` messages become events; everything else is
/// dropped with a debug log.
fn parse_position(raw: &str) -> Option<PositionUpdate> {
    let event: WirePositionEvent = serde_json::from_str(raw).ok()?;
    if event.kind != "position" {
        return None;
    }
    Some(PositionUpdate {
        device_id: event.device_id,
        lat: event.lat,
        lng: event.lng,
        speed: event.speed,
        ts: event.ts,
    })
}

/// Connects to the live stream and keeps reconnecting with capped
/// exponential backoff. The task ends when the receiver is dropped.
pub fn spawn_stream(ws_url: String) -> mpsc::Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(run_stream(ws_url, tx));
    rx
}

async fn run_stream(ws_url: String, tx: mpsc::Sender<StreamEvent>) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match connect_async(ws_url.as_str()).await {
            Ok((socket, _)) => {
                backoff = INITIAL_BACKOFF;
                tracing::info!(%ws_url, "live stream connected");
                if tx.send(StreamEvent::Connected).await.is_err() {
                    return;
                }

                let (_write, mut read) = socket.split();
                while let Some(item) = read.next().await {
                    match item {
                        Ok(Message::Text(text)) => match parse_position(&text) {
                            Some(update) => {
                                if tx.send(StreamEvent::Position(update)).await.is_err() {
                                    return;
                                }
                            }
                            None => {
                                tracing::debug!(payload = %text, "dropping unrecognized stream payload");
                            }
                        },
                        Ok(_) => {}
                        Err(error) => {
                            tracing::warn!(%error, "live stream read error");
                            break;
                        }
                    }
                }

                tracing::info!("live stream disconnected");
                if tx.send(StreamEvent::Disconnected).await.is_err() {
                    return;
                }
            }
            Err(error) => {
                tracing::warn!(%error, "live stream connect failed");
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_accepts_wire_shape() {
        let raw = r#"{"type":"position","device_id":"d1","lat":3.0,"lng":4.0,"speed":0.0,"ts":"2026-08-20T12:00:00Z"}"#;
        let update = parse_position(raw).unwrap();
        assert_eq!(update.device_id, "d1");
        assert_eq!((update.lat, update.lng), (3.0, 4.0));
        assert_eq!(update.speed, Some(0.0));
        assert!(update.ts.is_some());
    }

    #[test]
    fn test_parse_position_drops_other_message_types() {
        let raw = r#"{"type":"heartbeat","device_id":"d1","lat":0.0,"lng":0.0}"#;
        assert!(parse_position(raw).is_none());
    }

    #[test]
    fn test_parse_position_drops_malformed_payloads() {
        assert!(parse_position("not json").is_none());
        assert!(parse_position(r#"{"type":"position"}"#).is_none());
        assert!(parse_position(r#"{"type":"position","device_id":"d1"}"#).is_none());
    }

    #[test]
    fn test_parse_position_tolerates_missing_optionals() {
        let raw = r#"{"type":"position","device_id":"d1","lat":1.0,"lng":2.0}"#;
        let update = parse_position(raw).unwrap();
        assert_eq!(update.speed, None);
        assert_eq!(update.ts, None);
    }
}
