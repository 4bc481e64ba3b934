//! WebSocket connection handlers.
//!
//! 1 接続につき 2 つのタスクを動かします。
//! - 受信タスク: テキストフレームを `ClientEvent` として読み、検証して UseCase に渡す
//! - 送信タスク: MessagePusher のチャンネルに積まれた JSON を順番に WebSocket へ書き出す
//!
//! どちらかが終わればもう一方も止め、接続を全ての Room から外します。

use std::{fmt::Display, sync::Arc};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, RoomEvent, RoomRequest},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's channel into the WebSocket sink.
///
/// Messages arrive in the order they were pushed, which gives per-connection FIFO delivery.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_client(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' opened", connection_id);

    // 最初のフレームで接続 ID を知らせる
    let connected = RoomEvent::Connected {
        connection_id: connection_id.clone(),
    };
    if let Err(e) = state.message_pusher.push_to(&connection_id, &connected).await {
        tracing::error!("Failed to greet connection '{}': {}", connection_id, e);
        state.message_pusher.unregister_client(&connection_id).await;
        return;
    }

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", recv_connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&recv_state, &recv_connection_id, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.leave_room_usecase.execute(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}

/// テキストフレーム 1 つを処理する。不正なフレームは捨てて接続は維持する
async fn handle_text(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Malformed frame from '{}': {}", connection_id, e);
            return;
        }
    };
    let request = match RoomRequest::try_from(event) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Invalid event from '{}': {}", connection_id, e);
            return;
        }
    };
    dispatch(state, connection_id, request).await;
}

/// 失敗は呼び出し元に返さない（範囲外の index や未知の Room は何もしない）
fn ignore_failure<T, E: Display>(connection_id: &ConnectionId, event: &str, result: Result<T, E>) {
    if let Err(e) = result {
        tracing::debug!("Ignored '{}' from '{}': {}", event, connection_id, e);
    }
}

async fn dispatch(state: &AppState, connection_id: &ConnectionId, request: RoomRequest) {
    match request {
        RoomRequest::JoinRoom { room_id, username } => {
            let result = state
                .join_room_usecase
                .execute(connection_id.clone(), room_id, username)
                .await;
            ignore_failure(connection_id, "join_room", result);
        }
        RoomRequest::AddToPlaylist { room_id, video } => {
            let result = state.add_to_playlist_usecase.execute(&room_id, video).await;
            ignore_failure(connection_id, "add_to_playlist", result);
        }
        RoomRequest::RemoveFromPlaylist { room_id, index } => {
            let result = state
                .remove_from_playlist_usecase
                .execute(&room_id, index)
                .await;
            ignore_failure(connection_id, "remove_from_playlist", result);
        }
        RoomRequest::ChangeVideo { room_id, index } => {
            let result = state.change_video_usecase.execute(&room_id, index).await;
            ignore_failure(connection_id, "change_video", result);
        }
        RoomRequest::Sync { room_id, action } => {
            let result = state
                .sync_playback_usecase
                .sync_action(connection_id, &room_id, action)
                .await;
            ignore_failure(connection_id, "sync_action", result);
        }
        RoomRequest::SyncResponse {
            requester_id,
            current_time,
            is_playing,
        } => {
            let result = state
                .sync_playback_usecase
                .sync_response(&requester_id, current_time, is_playing)
                .await;
            ignore_failure(connection_id, "sync_response", result);
        }
        RoomRequest::SendMessage {
            room_id,
            username,
            message,
        } => {
            let result = state
                .send_message_usecase
                .execute(&room_id, username, message)
                .await;
            ignore_failure(connection_id, "send_message", result);
        }
        RoomRequest::AskForTime { room_id } => {
            let result = state
                .sync_playback_usecase
                .ask_for_time(connection_id, &room_id)
                .await;
            ignore_failure(connection_id, "ask_for_time", result);
        }
        RoomRequest::ToggleMute { room_id, is_muted } => {
            let result = state
                .toggle_mute_usecase
                .execute(connection_id, &room_id, is_muted)
                .await;
            ignore_failure(connection_id, "toggle_mute", result);
        }
        RoomRequest::Signal {
            kind,
            target,
            payload,
        } => {
            let result = state
                .relay_signal_usecase
                .execute(connection_id, kind, &target, payload)
                .await;
            ignore_failure(connection_id, "signal", result);
        }
    }
}
