//! WebSocket stream of ledger events
//!
//! Every successful mutation made through the API is pushed to connected
//! clients as JSON.

use crate::ledger::LedgerEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Maximum number of events to buffer per subscriber
const BROADCAST_CAPACITY: usize = 100;

/// Messages pushed to WebSocket clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    /// A ledger operation succeeded
    Ledger { event: LedgerEvent },
    /// Connection established
    Connected { message: String },
}

/// Broadcaster for WebSocket events
#[derive(Debug)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsEvent>,
}

impl WsBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: WsEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<crate::api::handlers::ApiState>,
) -> impl IntoResponse {
    let broadcaster = state.ws_broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<WsBroadcaster>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcaster.subscribe();
    log::debug!(
        "WebSocket client connected ({} subscribers)",
        broadcaster.subscriber_count()
    );

    let welcome = WsEvent::Connected {
        message: "Connected to ledger event stream".to_string(),
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("WebSocket client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    log::debug!("Ignoring client message: {}", text);
                }
                Err(e) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Address;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = WsBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        let event = LedgerEvent::AddedToDenylist {
            account: Address::from_label("alice"),
        };
        broadcaster.broadcast(WsEvent::Ledger {
            event: event.clone(),
        });

        match rx.recv().await.unwrap() {
            WsEvent::Ledger { event: received } => assert_eq!(received, event),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let broadcaster = WsBroadcaster::new();
        broadcaster.broadcast(WsEvent::Connected {
            message: "nobody listening".to_string(),
        });
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_ws_event_json() {
        let json = serde_json::to_value(WsEvent::Ledger {
            event: LedgerEvent::RemovedFromDenylist {
                account: Address::ZERO,
            },
        })
        .unwrap();

        assert_eq!(json["type"], "Ledger");
        assert_eq!(json["data"]["event"]["type"], "RemovedFromDenylist");
    }
}
