//! クライアントからの要求（検証済み）
//!
//! ワイヤ上の DTO はこの型に変換されてから UseCase に渡されます。
//! 変換に失敗したイベントは Room Store に到達しません。

use super::{
    entity::PlaybackAction,
    event::SignalKind,
    value_object::{ConnectionId, MessageBody, PlaybackTime, RoomId, Username, VideoRef},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RoomRequest {
    JoinRoom {
        room_id: RoomId,
        username: Username,
    },
    AddToPlaylist {
        room_id: RoomId,
        video: VideoRef,
    },
    RemoveFromPlaylist {
        room_id: RoomId,
        index: usize,
    },
    ChangeVideo {
        room_id: RoomId,
        index: usize,
    },
    Sync {
        room_id: RoomId,
        action: PlaybackAction,
    },
    SyncResponse {
        requester_id: ConnectionId,
        current_time: PlaybackTime,
        is_playing: bool,
    },
    SendMessage {
        room_id: RoomId,
        username: Username,
        message: MessageBody,
    },
    AskForTime {
        room_id: RoomId,
    },
    ToggleMute {
        room_id: RoomId,
        is_muted: bool,
    },
    Signal {
        kind: SignalKind,
        target: ConnectionId,
        payload: serde_json::Value,
    },
}
