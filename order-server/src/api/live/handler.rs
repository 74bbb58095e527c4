use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::stream::{self, BoxStream, SelectAll};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::{Actor, AuthScope, GuardError};
use crate::core::ServerState;
use crate::db::repository::tenancy;
use crate::live::{LiveEvent, LiveHub, LiveTopic};
use crate::security_log;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct LiveQuery {
    token: String,
    branch_id: Option<i64>,
}

/// GET /api/live/ws?token=<JWT>
pub async fn live_ws(
    State(state): State<ServerState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let actor = state.jwt.authenticate(&query.token).map_err(|e| {
        security_log!(WARN, "live_auth_failed", error = %e);
        AppError::from(e)
    })?;
    let topics = topics_for(&state, &actor, query.branch_id).await?;

    Ok(ws.on_upgrade(move |socket| live_session(socket, state.live, topics)))
}

/// Topics a connection may listen on
async fn topics_for(
    state: &ServerState,
    actor: &Actor,
    branch_id: Option<i64>,
) -> Result<Vec<LiveTopic>, AppError> {
    match *actor {
        Actor::Customer { customer_id } => Ok(vec![LiveTopic::Customer(customer_id)]),
        Actor::Staff { user_id, scope } => {
            let mut topics = vec![LiveTopic::User(user_id)];
            // 未指定门店时只推送个人通知
            if let Some(branch) = scope.list_filter(branch_id)?.branch_id {
                if let AuthScope::Restaurant { restaurant_id, .. } = scope {
                    tenancy::find_branch(&state.db.pool, branch)
                        .await
                        .map_err(AppError::from)?
                        .filter(|b| b.restaurant_id == restaurant_id)
                        .ok_or(GuardError::BranchNotFound(branch))?;
                }
                topics.push(LiveTopic::Branch(branch));
            }
            Ok(topics)
        }
        Actor::System => Err(GuardError::StaffRequired.into()),
    }
}

/// One subscriber stream per topic. A lagging receiver yields `Resync` and
/// keeps going from the oldest retained event.
fn merged_events(hub: &LiveHub, topics: &[LiveTopic]) -> SelectAll<BoxStream<'static, LiveEvent>> {
    stream::select_all(topics.iter().map(|topic| {
        let rx = hub.subscribe(*topic);
        stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((event, rx)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Live subscriber lagged");
                    Some((LiveEvent::Resync, rx))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed()
    }))
}

async fn live_session(socket: WebSocket, hub: LiveHub, topics: Vec<LiveTopic>) {
    let (mut sink, mut stream) = socket.split();
    let mut events = merged_events(&hub, &topics);
    tracing::info!(topics = ?topics, "Live WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = events.next() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize live event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    // 客户端消息忽略
                    _ => {}
                }
            }
        }
    }

    tracing::info!(topics = ?topics, "Live WS disconnected");
}
