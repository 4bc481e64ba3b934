//! UseCase: 再生する動画の切り替え

use std::sync::Arc;

use crate::domain::{MessagePusher, PlaybackView, RoomEvent, RoomId, RoomRepository};

use super::error::PlaylistError;

pub struct ChangeVideoUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ChangeVideoUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 切り替えた動画は先頭から再生中の状態になり、Room 全体に `video_changed` が届く
    pub async fn execute(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<PlaybackView, PlaylistError> {
        let change = self.repository.set_current_index(room_id, index).await?;
        self.message_pusher
            .broadcast(change.members, &RoomEvent::VideoChanged(change.outcome))
            .await?;
        Ok(change.outcome)
    }
}
