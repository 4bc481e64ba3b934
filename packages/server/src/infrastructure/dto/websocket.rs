//! WebSocket event DTOs.
//!
//! Every frame is a JSON text message of the form `{"event": <name>, "data": {...}}`.
//! Payload field names are camelCase.

use serde::{Deserialize, Serialize};

// ========================================
// Client → Server
// ========================================

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    AddToPlaylist(AddToPlaylistPayload),
    RemoveFromPlaylist(PlaylistIndexPayload),
    ChangeVideo(PlaylistIndexPayload),
    SyncAction(SyncActionPayload),
    SyncResponse(SyncResponsePayload),
    SendMessage(SendMessagePayload),
    AskForTime(RoomOnlyPayload),
    ToggleMute(ToggleMutePayload),
    Offer(OutgoingSignal),
    Answer(OutgoingSignal),
    #[serde(rename = "ice-candidate")]
    IceCandidate(OutgoingSignal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToPlaylistPayload {
    pub room_id: String,
    pub video_url: String,
}

/// Payload of `remove_from_playlist` and `change_video`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistIndexPayload {
    pub room_id: String,
    pub index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncActionKind {
    Play,
    Pause,
    Seek,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncActionData {
    pub current_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncActionPayload {
    pub room_id: String,
    pub action: SyncActionKind,
    pub data: SyncActionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponsePayload {
    pub requester_id: String,
    pub current_time: f64,
    pub is_playing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    pub username: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOnlyPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleMutePayload {
    pub room_id: String,
    pub is_muted: bool,
}

/// Signaling message addressed to one connection.
///
/// `caller_id` is accepted for compatibility but the server always overwrites it
/// with the sender's real connection id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingSignal {
    pub payload: serde_json::Value,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
}

// ========================================
// Server → Client
// ========================================

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected(ConnectedPayload),
    RoomState(RoomStatePayload),
    PlaylistUpdated(PlaylistUpdatedPayload),
    VideoChanged(VideoChangedPayload),
    SyncPlay(SyncPayload),
    SyncPause(SyncPayload),
    SyncSeek(SyncPayload),
    RequestSync(RequestSyncPayload),
    ChatMessage(ChatMessageDto),
    UserJoined(RosterPayload),
    UserLeft(RosterPayload),
    UserMuted(UserMutedPayload),
    Offer(RelayedSignal),
    Answer(RelayedSignal),
    #[serde(rename = "ice-candidate")]
    IceCandidate(RelayedSignal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub username: String,
    pub message: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatePayload {
    pub playlist: Vec<String>,
    pub current_index: usize,
    pub is_playing: bool,
    pub current_time: f64,
    pub users: Vec<UserDto>,
    pub messages: Vec<ChatMessageDto>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistUpdatedPayload {
    pub playlist: Vec<String>,
    pub current_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoChangedPayload {
    pub current_index: usize,
    pub current_time: f64,
    pub is_playing: bool,
    pub seq: u64,
}

/// Payload of `sync_play`, `sync_pause` and `sync_seek`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub current_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSyncPayload {
    pub requester_id: String,
}

/// Payload of `user_joined` and `user_left`; always carries the full roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPayload {
    pub username: String,
    pub users: Vec<UserDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMutedPayload {
    pub user_id: String,
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedSignal {
    pub payload: serde_json::Value,
    pub caller_id: String,
}
