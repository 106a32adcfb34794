//! Live update fan-out to WebSocket clients.

use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

use axum::{
	extract::{
		State,
		ws::{Message, WebSocket, WebSocketUpgrade},
	},
	response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use crate::state::AppState;
use daybook_service::LiveUpdateSink;

/// Messages buffered per connection before a slow client is dropped.
pub const LIVE_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Serialize)]
struct LiveMessage<'a> {
	#[serde(rename = "type")]
	event_type: &'a str,
	data: Value,
	timestamp: String,
}

/// Open WebSocket connections, each fed through its own bounded queue.
#[derive(Default)]
pub struct ConnectionRegistry {
	next_id: AtomicU64,
	connections: Mutex<HashMap<u64, Sender<String>>>,
}
impl ConnectionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a connection and returns its id plus both ends of its queue.
	pub fn connect(&self) -> (u64, Sender<String>, Receiver<String>) {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let (tx, rx) = mpsc::channel(LIVE_QUEUE_CAPACITY);

		self.lock().insert(id, tx.clone());

		(id, tx, rx)
	}

	pub fn disconnect(&self, id: u64) {
		self.lock().remove(&id);
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Queues `text` for every connection without waiting. Closed connections and connections
	/// whose queue is full are dropped.
	pub fn broadcast_text(&self, text: &str) {
		let mut connections = self.lock();

		connections.retain(|id, tx| match tx.try_send(text.to_string()) {
			Ok(()) => true,
			Err(TrySendError::Full(_)) => {
				tracing::warn!(connection_id = id, "Dropping slow live update connection.");

				false
			},
			Err(TrySendError::Closed(_)) => {
				tracing::debug!(connection_id = id, "Dropping closed live update connection.");

				false
			},
		});
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Sender<String>>> {
		self.connections.lock().unwrap_or_else(|err| err.into_inner())
	}
}
impl LiveUpdateSink for ConnectionRegistry {
	fn publish(&self, event_type: &str, data: Value) {
		let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
		let message = LiveMessage { event_type, data, timestamp };

		match serde_json::to_string(&message) {
			Ok(text) => self.broadcast_text(&text),
			Err(err) => tracing::warn!(event_type, error = %err, "Failed to encode live update."),
		}
	}
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
	let (id, tx, mut rx) = state.live.connect();
	// Once the registry drops this connection, the queue closes and the send task ends.
	let pong_tx = tx.downgrade();

	drop(tx);

	let (mut sender, mut receiver) = socket.split();

	tracing::info!(connection_id = id, active = state.live.len(), "WebSocket connected.");

	let mut send_task = tokio::spawn(async move {
		while let Some(text) = rx.recv().await {
			if sender.send(Message::Text(text.into())).await.is_err() {
				break;
			}
		}
	});
	let mut recv_task = tokio::spawn(async move {
		while let Some(Ok(message)) = receiver.next().await {
			match message {
				Message::Text(text) if text.as_str() == "ping" => {
					let Some(tx) = pong_tx.upgrade() else {
						break;
					};

					if tx.try_send("pong".to_string()).is_err() {
						break;
					}
				},
				Message::Close(_) => break,
				_ => {},
			}
		}
	});

	tokio::select! {
		_ = &mut send_task => recv_task.abort(),
		_ = &mut recv_task => send_task.abort(),
	}

	state.live.disconnect(id);

	tracing::info!(connection_id = id, active = state.live.len(), "WebSocket disconnected.");
}
