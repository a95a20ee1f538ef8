use axum::extract::ws::Message;
use axum::{
    extract::{ws::{WebSocket, WebSocketUpgrade}, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use crate::simulator::parse_signal;
use crate::sink::MonitoringSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub value: i32,
    pub timestamp: DateTime<Utc>,
}

impl TemperatureSample {
    pub fn now(value: i32) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
        }
    }

    pub fn to_message(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "temperature",
            "timestamp": self.timestamp.to_rfc3339(),
            "value": self.value,
        })
    }
}

/// Monitoring sink broadcasting each value to connected dashboard clients.
#[derive(Clone)]
pub struct DashboardSink {
    tx: broadcast::Sender<TemperatureSample>,
}

impl DashboardSink {
    pub fn new(tx: broadcast::Sender<TemperatureSample>) -> Self {
        Self { tx }
    }
}

impl MonitoringSink for DashboardSink {
    fn send(&self, value: i32) {
        // No subscribers is not an error.
        let _ = self.tx.send(TemperatureSample::now(value));
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tx: broadcast::Sender<TemperatureSample>,
}

pub async fn start_ws_server(
    tx: broadcast::Sender<TemperatureSample>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app_state = AppState { tx };

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Dashboard WebSocket listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New dashboard connection");

    let mut rx = state.tx.subscribe();

    loop {
        tokio::select! {
            sample = rx.recv() => {
                match sample {
                    Ok(sample) => {
                        if let Ok(json) = serde_json::to_string(&sample.to_message()) {
                            if socket.send(Message::Text(json)).await.is_err() {
                                tracing::info!("Dashboard client disconnected");
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dashboard client lagging, skipped {} samples", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => handle_signal(&text),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        tracing::info!("Dashboard connection closed");
                        break;
                    }
                }
            }
        }
    }
}

/// Dashboards may report their own readings as `TemperatureValue=<number>`.
fn handle_signal(text: &str) {
    match parse_signal(text) {
        Ok(value) => tracing::info!("Dashboard reported temperature value: {}", value),
        Err(e) => tracing::warn!("Ignoring dashboard message {:?}: {}", text, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_shape() {
        let sample = TemperatureSample::now(812);
        let message = sample.to_message();

        assert_eq!(message["type"], "temperature");
        assert_eq!(message["value"], 812);
        assert_eq!(message["timestamp"], sample.timestamp.to_rfc3339());
    }

    #[tokio::test]
    async fn dashboard_sink_broadcasts() {
        let (tx, mut rx) = broadcast::channel(4);
        let sink = DashboardSink::new(tx);

        sink.send(640);
        sink.send(990);

        assert_eq!(rx.recv().await.unwrap().value, 640);
        assert_eq!(rx.recv().await.unwrap().value, 990);
    }

    #[test]
    fn dashboard_sink_without_clients() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        DashboardSink::new(tx).send(700);
    }
}
