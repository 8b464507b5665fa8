pub mod events;
pub mod presence;
pub mod rooms;
pub mod session;

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use studygroup_domain::identity::ActorIdentity;
use studygroup_domain::util::uuid_v7_without_dashes;
use tokio::time::interval;
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use self::events::{ClientEvent, ServerEvent};
use self::session::Session;
use crate::error::ApiError;
use crate::middleware::{bearer_token, decode_identity};
use crate::observability;
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct GatewayQuery {
    token: Option<String>,
}

/// Browsers cannot set headers on a WebSocket handshake, so the token is
/// also accepted as a query parameter. Authentication happens before the
/// upgrade; a bad token never becomes a socket.
pub async fn gateway_ws(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or(ApiError::Unauthorized)?;
    let actor = decode_identity(&state.config.jwt_secret, token).ok_or_else(|| {
        observability::register_gateway_connection("rejected");
        ApiError::Unauthorized
    })?;

    observability::register_gateway_connection("accepted");
    Ok(ws.on_upgrade(move |socket| run_connection(socket, state, actor)))
}

async fn run_connection(socket: WebSocket, state: AppState, actor: ActorIdentity) {
    let connection_id = uuid_v7_without_dashes();
    let session = Session::new(state.clone(), actor, connection_id);
    session.announce_connect().await;

    let (mut sink, mut incoming) = socket.split();
    let mut streams: StreamMap<String, BroadcastStream<ServerEvent>> = StreamMap::new();
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            frame = incoming.next() => {
                let Some(Ok(frame)) = frame else { break };
                match frame {
                    Message::Text(text) => {
                        let event = match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => event,
                            Err(err) => {
                                tracing::debug!(error = %err, "unparseable gateway frame");
                                let reply = ServerEvent::Error {
                                    group_id: None,
                                    message: "unrecognized event".into(),
                                };
                                if send_event(&mut sink, &reply).await.is_err() {
                                    break;
                                }
                                continue;
                            }
                        };
                        let reply = session.handle_event(event).await;
                        let mut failed = false;
                        for event in &reply.direct {
                            if send_event(&mut sink, event).await.is_err() {
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                        if let Some(group_id) = reply.subscribe {
                            if !streams.contains_key(&group_id) {
                                let receiver = state.rooms.subscribe(&group_id).await;
                                streams.insert(group_id, BroadcastStream::new(receiver));
                            }
                        }
                        if let Some(group_id) = reply.unsubscribe {
                            streams.remove(&group_id);
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            broadcast = streams.next(), if !streams.is_empty() => {
                let Some((group_id, result)) = broadcast else { continue };
                match result {
                    Ok(event) => {
                        if event.suppressed_for(session.user_id()) {
                            continue;
                        }
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(missed)) => {
                        tracing::warn!(
                            group_id,
                            missed,
                            user_id = session.user_id(),
                            "gateway consumer lagged"
                        );
                        let reply = ServerEvent::Error {
                            group_id: Some(group_id),
                            message: "resync required".into(),
                        };
                        if send_event(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                }
            }
            _ = heartbeat.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    session.teardown().await;
    observability::register_gateway_connection("closed");
}

async fn send_event(
    sink: &mut (impl Sink<Message> + Unpin),
    event: &ServerEvent,
) -> Result<(), ()> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize gateway event");
            return Ok(());
        }
    };
    sink.send(Message::Text(payload)).await.map_err(|_| ())
}
