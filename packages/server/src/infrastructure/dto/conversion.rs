//! Conversion logic between DTOs and domain types.
//!
//! Inbound events are validated here: a `ClientEvent` that fails to convert
//! never reaches the room store.

use crate::domain::{
    ChatEntry, ConnectionId, MessageBody, PlaybackAction, PlaybackTime, Room, RoomEvent, RoomId,
    RoomMember, RoomRequest, SignalKind, Username, ValueObjectError, VideoRef,
};
use crate::infrastructure::dto::{http, websocket as dto};
use tandem_shared::time::timestamp_to_rfc3339;

// ========================================
// DTO → Domain
// ========================================

fn index_from(index: i64) -> Result<usize, ValueObjectError> {
    usize::try_from(index).map_err(|_| ValueObjectError::NegativeIndex(index))
}

fn signal_request(
    kind: SignalKind,
    signal: dto::OutgoingSignal,
) -> Result<RoomRequest, ValueObjectError> {
    Ok(RoomRequest::Signal {
        kind,
        target: ConnectionId::new(signal.target)?,
        payload: signal.payload,
    })
}

impl TryFrom<dto::SyncActionPayload> for PlaybackAction {
    type Error = ValueObjectError;

    fn try_from(payload: dto::SyncActionPayload) -> Result<Self, Self::Error> {
        let at = PlaybackTime::new(payload.data.current_time)?;
        Ok(match payload.action {
            dto::SyncActionKind::Play => PlaybackAction::Play { at },
            dto::SyncActionKind::Pause => PlaybackAction::Pause { at },
            dto::SyncActionKind::Seek => PlaybackAction::Seek {
                at,
                is_playing: payload.data.is_playing,
            },
        })
    }
}

impl TryFrom<dto::ClientEvent> for RoomRequest {
    type Error = ValueObjectError;

    fn try_from(event: dto::ClientEvent) -> Result<Self, Self::Error> {
        let request = match event {
            dto::ClientEvent::JoinRoom(p) => RoomRequest::JoinRoom {
                room_id: RoomId::new(p.room_id)?,
                username: Username::new(p.username)?,
            },
            dto::ClientEvent::AddToPlaylist(p) => RoomRequest::AddToPlaylist {
                room_id: RoomId::new(p.room_id)?,
                video: VideoRef::new(p.video_url)?,
            },
            dto::ClientEvent::RemoveFromPlaylist(p) => RoomRequest::RemoveFromPlaylist {
                room_id: RoomId::new(p.room_id)?,
                index: index_from(p.index)?,
            },
            dto::ClientEvent::ChangeVideo(p) => RoomRequest::ChangeVideo {
                room_id: RoomId::new(p.room_id)?,
                index: index_from(p.index)?,
            },
            dto::ClientEvent::SyncAction(p) => {
                let room_id = RoomId::new(p.room_id.clone())?;
                RoomRequest::Sync {
                    room_id,
                    action: PlaybackAction::try_from(p)?,
                }
            }
            dto::ClientEvent::SyncResponse(p) => RoomRequest::SyncResponse {
                requester_id: ConnectionId::new(p.requester_id)?,
                current_time: PlaybackTime::new(p.current_time)?,
                is_playing: p.is_playing,
            },
            dto::ClientEvent::SendMessage(p) => RoomRequest::SendMessage {
                room_id: RoomId::new(p.room_id)?,
                username: Username::new(p.username)?,
                message: MessageBody::new(p.message)?,
            },
            dto::ClientEvent::AskForTime(p) => RoomRequest::AskForTime {
                room_id: RoomId::new(p.room_id)?,
            },
            dto::ClientEvent::ToggleMute(p) => RoomRequest::ToggleMute {
                room_id: RoomId::new(p.room_id)?,
                is_muted: p.is_muted,
            },
            dto::ClientEvent::Offer(s) => return signal_request(SignalKind::Offer, s),
            dto::ClientEvent::Answer(s) => return signal_request(SignalKind::Answer, s),
            dto::ClientEvent::IceCandidate(s) => {
                return signal_request(SignalKind::IceCandidate, s);
            }
        };
        Ok(request)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&RoomMember> for dto::UserDto {
    fn from(member: &RoomMember) -> Self {
        Self {
            id: member.connection_id.as_str().to_string(),
            username: member.username.as_str().to_string(),
        }
    }
}

impl From<&ChatEntry> for dto::ChatMessageDto {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            username: entry.username.as_str().to_string(),
            message: entry.message.as_str().to_string(),
            timestamp: entry.timestamp.value(),
        }
    }
}

fn users(members: &[RoomMember]) -> Vec<dto::UserDto> {
    members.iter().map(dto::UserDto::from).collect()
}

fn playlist(videos: &[VideoRef]) -> Vec<String> {
    videos.iter().map(|video| video.as_str().to_string()).collect()
}

impl From<&Room> for dto::RoomStatePayload {
    fn from(room: &Room) -> Self {
        Self {
            playlist: playlist(&room.playlist),
            current_index: room.current_index,
            is_playing: room.is_playing,
            current_time: room.current_time.seconds(),
            users: users(&room.users),
            messages: room.messages.iter().map(dto::ChatMessageDto::from).collect(),
            seq: room.seq,
        }
    }
}

impl From<&RoomEvent> for dto::ServerEvent {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::Connected { connection_id } => {
                dto::ServerEvent::Connected(dto::ConnectedPayload {
                    connection_id: connection_id.as_str().to_string(),
                })
            }
            RoomEvent::RoomState(room) => dto::ServerEvent::RoomState(room.into()),
            RoomEvent::PlaylistUpdated(view) => {
                dto::ServerEvent::PlaylistUpdated(dto::PlaylistUpdatedPayload {
                    playlist: playlist(&view.playlist),
                    current_index: view.current_index,
                })
            }
            RoomEvent::VideoChanged(view) => {
                dto::ServerEvent::VideoChanged(dto::VideoChangedPayload {
                    current_index: view.current_index,
                    current_time: view.current_time.seconds(),
                    is_playing: view.is_playing,
                    seq: view.seq,
                })
            }
            RoomEvent::SyncPlay { current_time, seq } => {
                dto::ServerEvent::SyncPlay(dto::SyncPayload {
                    current_time: current_time.seconds(),
                    is_playing: None,
                    seq: *seq,
                })
            }
            RoomEvent::SyncPause { current_time, seq } => {
                dto::ServerEvent::SyncPause(dto::SyncPayload {
                    current_time: current_time.seconds(),
                    is_playing: None,
                    seq: *seq,
                })
            }
            RoomEvent::SyncSeek {
                current_time,
                is_playing,
                seq,
            } => dto::ServerEvent::SyncSeek(dto::SyncPayload {
                current_time: current_time.seconds(),
                is_playing: *is_playing,
                seq: *seq,
            }),
            RoomEvent::RequestSync { requester_id } => {
                dto::ServerEvent::RequestSync(dto::RequestSyncPayload {
                    requester_id: requester_id.as_str().to_string(),
                })
            }
            RoomEvent::ChatMessage(entry) => dto::ServerEvent::ChatMessage(entry.into()),
            RoomEvent::UserJoined { username, users: members } => {
                dto::ServerEvent::UserJoined(dto::RosterPayload {
                    username: username.as_str().to_string(),
                    users: users(members),
                })
            }
            RoomEvent::UserLeft { username, users: members } => {
                dto::ServerEvent::UserLeft(dto::RosterPayload {
                    username: username.as_str().to_string(),
                    users: users(members),
                })
            }
            RoomEvent::UserMuted { user_id, is_muted } => {
                dto::ServerEvent::UserMuted(dto::UserMutedPayload {
                    user_id: user_id.as_str().to_string(),
                    is_muted: *is_muted,
                })
            }
            RoomEvent::Signal {
                kind,
                payload,
                caller_id,
            } => {
                let relayed = dto::RelayedSignal {
                    payload: payload.clone(),
                    caller_id: caller_id.as_str().to_string(),
                };
                match kind {
                    SignalKind::Offer => dto::ServerEvent::Offer(relayed),
                    SignalKind::Answer => dto::ServerEvent::Answer(relayed),
                    SignalKind::IceCandidate => dto::ServerEvent::IceCandidate(relayed),
                }
            }
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            users: room
                .users
                .iter()
                .map(|member| member.username.as_str().to_string())
                .collect(),
            playlist_length: room.playlist.len(),
            is_playing: room.is_playing,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            playlist: playlist(&room.playlist),
            current_index: room.current_index,
            is_playing: room.is_playing,
            current_time: room.current_time.seconds(),
            seq: room.seq,
            users: users(&room.users),
            message_count: room.messages.len(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<RoomRequest, ValueObjectError> {
        let event: dto::ClientEvent = serde_json::from_value(value).unwrap();
        RoomRequest::try_from(event)
    }

    fn member(id: &str, name: &str) -> RoomMember {
        RoomMember::new(
            ConnectionId::new(id.to_string()).unwrap(),
            Username::new(name.to_string()).unwrap(),
        )
    }

    #[test]
    fn test_join_room_converts_to_request() {
        // テスト項目: join_room が検証済みの RoomRequest に変換される
        // given (前提条件):
        let value = json!({"event": "join_room", "data": {"roomId": " R ", "username": "alice"}});

        // when (操作):
        let request = parse(value).unwrap();

        // then (期待する結果):
        assert_eq!(
            request,
            RoomRequest::JoinRoom {
                room_id: RoomId::new("R".to_string()).unwrap(),
                username: Username::new("alice".to_string()).unwrap(),
            }
        );
    }

    #[test]
    fn test_negative_index_is_rejected() {
        // テスト項目: 負の index はストアに届く前に拒否される
        // given (前提条件):
        let value = json!({"event": "remove_from_playlist", "data": {"roomId": "R", "index": -1}});

        // when (操作):
        let result = parse(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::NegativeIndex(-1)));
    }

    #[test]
    fn test_negative_playback_time_is_rejected() {
        // テスト項目: 負の再生位置を持つ sync_action は拒否される
        // given (前提条件):
        let value = json!({
            "event": "sync_action",
            "data": {"roomId": "R", "action": "play", "data": {"currentTime": -3.0}}
        });

        // when (操作):
        let result = parse(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Negative(-3.0)));
    }

    #[test]
    fn test_empty_username_is_rejected() {
        // テスト項目: 空白のみのユーザー名は拒否される
        // given (前提条件):
        let value = json!({"event": "join_room", "data": {"roomId": "R", "username": "   "}});

        // when (操作):
        let result = parse(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("username")));
    }

    #[test]
    fn test_seek_keeps_optional_is_playing() {
        // テスト項目: seek の isPlaying 指定がそのまま PlaybackAction に渡る
        // given (前提条件):
        let value = json!({
            "event": "sync_action",
            "data": {"roomId": "R", "action": "seek", "data": {"currentTime": 42.0, "isPlaying": false}}
        });

        // when (操作):
        let request = parse(value).unwrap();

        // then (期待する結果):
        assert_eq!(
            request,
            RoomRequest::Sync {
                room_id: RoomId::new("R".to_string()).unwrap(),
                action: PlaybackAction::Seek {
                    at: PlaybackTime::new(42.0).unwrap(),
                    is_playing: Some(false),
                },
            }
        );
    }

    #[test]
    fn test_signal_ignores_client_supplied_caller_id() {
        // テスト項目: クライアントが送った callerId は RoomRequest に含まれない
        // given (前提条件):
        let value = json!({
            "event": "offer",
            "data": {"payload": {"type": "offer", "sdp": "v=0"}, "target": "c2", "callerId": "spoofed"}
        });

        // when (操作):
        let request = parse(value).unwrap();

        // then (期待する結果):
        assert_eq!(
            request,
            RoomRequest::Signal {
                kind: SignalKind::Offer,
                target: ConnectionId::new("c2".to_string()).unwrap(),
                payload: json!({"type": "offer", "sdp": "v=0"}),
            }
        );
    }

    #[test]
    fn test_room_state_event_to_dto() {
        // テスト項目: RoomState イベントが参加者 ID・チャット履歴・seq を含む DTO に変換される
        // given (前提条件):
        let mut room = Room::new(RoomId::new("R".to_string()).unwrap(), Timestamp::new(0));
        room.append_video(VideoRef::new("https://v/1".to_string()).unwrap());
        room.add_member(member("c1", "alice"));
        room.append_message(ChatEntry::new(
            Username::new("alice".to_string()).unwrap(),
            MessageBody::new("hi".to_string()).unwrap(),
            Timestamp::new(1_000),
        ));
        room.apply_playback(PlaybackAction::Play {
            at: PlaybackTime::new(5.0).unwrap(),
        });

        // when (操作):
        let event = dto::ServerEvent::from(&RoomEvent::RoomState(room));

        // then (期待する結果):
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "room_state",
                "data": {
                    "playlist": ["https://v/1"],
                    "currentIndex": 0,
                    "isPlaying": true,
                    "currentTime": 5.0,
                    "users": [{"id": "c1", "username": "alice"}],
                    "messages": [{"username": "alice", "message": "hi", "timestamp": 1000}],
                    "seq": 1
                }
            })
        );
    }

    #[test]
    fn test_signal_event_carries_caller_id() {
        // テスト項目: リレーされる ice-candidate に送信元の callerId が付く
        // given (前提条件):
        let event = RoomEvent::Signal {
            kind: SignalKind::IceCandidate,
            payload: json!({"candidate": "c"}),
            caller_id: ConnectionId::new("c1".to_string()).unwrap(),
        };

        // when (操作):
        let value = serde_json::to_value(dto::ServerEvent::from(&event)).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"event": "ice-candidate", "data": {"payload": {"candidate": "c"}, "callerId": "c1"}})
        );
    }

    #[test]
    fn test_room_summary_lists_usernames() {
        // テスト項目: Room 一覧の DTO は参加者名とプレイリスト長を持つ
        // given (前提条件):
        let mut room = Room::new(
            RoomId::new("R".to_string()).unwrap(),
            Timestamp::new(1_672_531_200_123),
        );
        room.add_member(member("c1", "alice"));
        room.add_member(member("c2", "bob"));
        room.append_video(VideoRef::new("a".to_string()).unwrap());

        // when (操作):
        let summary = http::RoomSummaryDto::from(&room);

        // then (期待する結果):
        assert_eq!(summary.users, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(summary.playlist_length, 1);
        assert!(!summary.is_playing);
        assert_eq!(summary.created_at, "2023-01-01T00:00:00.123Z");
    }
}
