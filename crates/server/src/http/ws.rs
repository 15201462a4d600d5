// SPDX-License-Identifier: MIT

//! `GET /ws` — the event channel (spec.md §4.7, §4.9, §6).

use super::auth::bearer_token;
use crate::state::SharedState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use hearth_core::Clock;
use hearth_events::{InboundFrame, OutboundFrame};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cadence for the server-initiated protocol-level ping (spec.md §4.7 "a
/// periodic heartbeat probes liveness").
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// How long a peer may go without answering a ping before it is considered
/// dead (spec.md §5 "per-connection pong deadline on the event channel").
const PONG_DEADLINE: Duration = Duration::from_secs(90);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

pub async fn upgrade<C: Clock>(
    ws: WebSocketUpgrade,
    State(state): State<SharedState<C>>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Response {
    let origin = headers.get(axum::http::header::ORIGIN).and_then(|v| v.to_str().ok());
    if !crate::admission::origin_allowed(&state.allowed_origins, origin) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let token = match bearer_token(&headers).or(query.token.as_deref()) {
        Some(token) => token.to_string(),
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };
    let claims = match state.auth.validate(&token) {
        Ok(claims) => claims,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, claims.subject))
}

async fn handle_socket<C: Clock>(socket: WebSocket, state: SharedState<C>, subject: String) {
    let (mut sender, mut receiver) = socket.split();
    let (client_id, mut outbound) = state.events.register(subject);

    // `last_pong` is driven by the read half on every Pong frame and polled
    // by the write half's heartbeat ticker — read and write stay on
    // separate halves of the socket (spec.md §5) while still sharing
    // liveness state.
    let last_pong = Arc::new(AtomicU64::new(elapsed_ms(Instant::now())));
    let reader_last_pong = last_pong.clone();

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                frame = outbound.recv() => {
                    match frame {
                        Some(frame) => {
                            if sender.send(Message::Text(frame.to_json().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = heartbeat.tick() => {
                    let silent_for = elapsed_ms(Instant::now()).saturating_sub(last_pong.load(Ordering::Relaxed));
                    if silent_for > PONG_DEADLINE.as_millis() as u64 {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => handle_inbound(&state, client_id, &text),
            Message::Pong(_) => reader_last_pong.store(elapsed_ms(Instant::now()), Ordering::Relaxed),
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    state.events.deregister(client_id);
}

/// Monotonic milliseconds since an arbitrary fixed epoch, used only to
/// measure elapsed time between pings — never surfaced to clients or
/// compared against [`Clock`].
fn elapsed_ms(now: Instant) -> u64 {
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    let start = *START.get_or_init(Instant::now);
    now.saturating_duration_since(start).as_millis() as u64
}

fn handle_inbound<C: Clock>(state: &SharedState<C>, client_id: hearth_core::ClientId, text: &str) {
    let Ok(frame) = serde_json::from_str::<InboundFrame>(text) else {
        state.events.send_to(client_id, OutboundFrame::error("malformed frame"));
        return;
    };
    match frame {
        InboundFrame::Subscribe { job_id } => state.events.subscribe(client_id, job_id),
        InboundFrame::Unsubscribe { job_id } => state.events.unsubscribe(client_id, job_id),
        InboundFrame::Ping => state.events.send_to(client_id, OutboundFrame::Pong),
    }
}
