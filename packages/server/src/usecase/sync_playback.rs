//! UseCase: 再生同期
//!
//! - `sync_action`: 再生操作を Room に反映し、送信者以外に同期指示を送る
//! - `sync_response`: 既存の参加者が報告した再生位置を、要求した接続へ `sync_seek` として中継する
//! - `ask_for_time`: 送信者のために、他の参加者へ再生位置の報告を依頼する
//!
//! 同期指示には Room の `seq` が付き、受信側はこれで古い指示や自分の操作のエコーを見分けます。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PlaybackAction, PlaybackTime, PlaybackView, RepositoryError,
    RoomEvent, RoomId, RoomRepository,
};

use super::error::PlaybackError;

pub struct SyncPlaybackUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SyncPlaybackUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 再生操作を反映し、送信者以外に `sync_play` / `sync_pause` / `sync_seek` を送る
    pub async fn sync_action(
        &self,
        sender: &ConnectionId,
        room_id: &RoomId,
        action: PlaybackAction,
    ) -> Result<PlaybackView, PlaybackError> {
        let change = self.repository.apply_playback(room_id, action).await?;
        let targets = change
            .members
            .into_iter()
            .filter(|member| member != sender)
            .collect();
        let event = RoomEvent::sync_instruction(action, change.outcome);
        tracing::debug!(
            "Room '{}': {} at {:.2}s (seq {})",
            room_id,
            event.name(),
            action.at().seconds(),
            change.outcome.seq
        );
        self.message_pusher.broadcast(targets, &event).await?;
        Ok(change.outcome)
    }

    /// 報告された再生位置を要求元にだけ中継する（Room の状態は変えない）
    pub async fn sync_response(
        &self,
        requester_id: &ConnectionId,
        current_time: PlaybackTime,
        is_playing: bool,
    ) -> Result<(), PlaybackError> {
        let room = self
            .repository
            .find_room_of(requester_id)
            .await
            .ok_or_else(|| PlaybackError::NotInRoom(requester_id.to_string()))?;
        let event = RoomEvent::SyncSeek {
            current_time,
            is_playing: Some(is_playing),
            seq: room.seq,
        };
        self.message_pusher.push_to(requester_id, &event).await?;
        Ok(())
    }

    /// 送信者以外で最も古い参加者に `request_sync` を送る
    pub async fn ask_for_time(
        &self,
        sender: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<ConnectionId, PlaybackError> {
        let room = self
            .repository
            .get(room_id)
            .await
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))?;
        let source = room
            .sync_source_for(sender)
            .ok_or_else(|| PlaybackError::NoSyncSource(room_id.to_string()))?;
        let event = RoomEvent::RequestSync {
            requester_id: sender.clone(),
        };
        self.message_pusher.push_to(&source, &event).await?;
        Ok(source)
    }
}
