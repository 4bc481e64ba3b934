//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::UserDto;

/// Entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub users: Vec<String>,
    pub playlist_length: usize,
    pub is_playing: bool,
    /// RFC 3339
    pub created_at: String,
}

/// Body of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub playlist: Vec<String>,
    pub current_index: usize,
    pub is_playing: bool,
    pub current_time: f64,
    pub seq: u64,
    pub users: Vec<UserDto>,
    pub message_count: usize,
    /// RFC 3339
    pub created_at: String,
}
