//! Room から接続へ送り出されるイベント
//!
//! UseCase はこの型で「何を誰に届けるか」を決め、ワイヤ形式への変換は
//! Infrastructure 層（`infrastructure::dto`）が担います。

use super::{
    entity::{ChatEntry, PlaybackAction, PlaybackView, PlaylistView, Room, RoomMember},
    value_object::{ConnectionId, PlaybackTime, Username},
};

/// 通話確立のためにリレーされるシグナリングの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// 接続直後に本人へ送る、サーバーが採番した接続 ID
    Connected { connection_id: ConnectionId },
    /// 参加直後に本人へ送る Room 全体のスナップショット
    RoomState(Room),
    PlaylistUpdated(PlaylistView),
    VideoChanged(PlaybackView),
    SyncPlay {
        current_time: PlaybackTime,
        seq: u64,
    },
    SyncPause {
        current_time: PlaybackTime,
        seq: u64,
    },
    SyncSeek {
        current_time: PlaybackTime,
        is_playing: Option<bool>,
        seq: u64,
    },
    /// 既存の参加者に現在の再生位置を報告させる
    RequestSync { requester_id: ConnectionId },
    ChatMessage(ChatEntry),
    /// 参加者リストは差分ではなく常に全体を送る
    UserJoined {
        username: Username,
        users: Vec<RoomMember>,
    },
    UserLeft {
        username: Username,
        users: Vec<RoomMember>,
    },
    UserMuted {
        user_id: ConnectionId,
        is_muted: bool,
    },
    /// 送信元の接続 ID を付けてリレーされるシグナリング
    Signal {
        kind: SignalKind,
        payload: serde_json::Value,
        caller_id: ConnectionId,
    },
}

impl RoomEvent {
    /// 再生操作を反映した結果から、他の参加者へ配る同期指示を作る
    pub fn sync_instruction(action: PlaybackAction, view: PlaybackView) -> Self {
        match action {
            PlaybackAction::Play { .. } => RoomEvent::SyncPlay {
                current_time: view.current_time,
                seq: view.seq,
            },
            PlaybackAction::Pause { .. } => RoomEvent::SyncPause {
                current_time: view.current_time,
                seq: view.seq,
            },
            PlaybackAction::Seek { at, is_playing } => RoomEvent::SyncSeek {
                current_time: at,
                is_playing,
                seq: view.seq,
            },
        }
    }

    /// ログ出力用のイベント名（ワイヤ上の名前と同じ）
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::Connected { .. } => "connected",
            RoomEvent::RoomState(_) => "room_state",
            RoomEvent::PlaylistUpdated(_) => "playlist_updated",
            RoomEvent::VideoChanged(_) => "video_changed",
            RoomEvent::SyncPlay { .. } => "sync_play",
            RoomEvent::SyncPause { .. } => "sync_pause",
            RoomEvent::SyncSeek { .. } => "sync_seek",
            RoomEvent::RequestSync { .. } => "request_sync",
            RoomEvent::ChatMessage(_) => "chat_message",
            RoomEvent::UserJoined { .. } => "user_joined",
            RoomEvent::UserLeft { .. } => "user_left",
            RoomEvent::UserMuted { .. } => "user_muted",
            RoomEvent::Signal {
                kind: SignalKind::Offer,
                ..
            } => "offer",
            RoomEvent::Signal {
                kind: SignalKind::Answer,
                ..
            } => "answer",
            RoomEvent::Signal {
                kind: SignalKind::IceCandidate,
                ..
            } => "ice-candidate",
        }
    }
}
