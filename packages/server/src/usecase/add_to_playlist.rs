//! UseCase: プレイリストへの追加

use std::sync::Arc;

use crate::domain::{MessagePusher, PlaylistView, RoomEvent, RoomId, RoomRepository, VideoRef};

use super::error::PlaylistError;

pub struct AddToPlaylistUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl AddToPlaylistUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 動画を末尾に追加し、送信者を含む Room 全体に `playlist_updated` を送る
    pub async fn execute(
        &self,
        room_id: &RoomId,
        video: VideoRef,
    ) -> Result<PlaylistView, PlaylistError> {
        let change = self.repository.append_to_playlist(room_id, video).await?;
        self.message_pusher
            .broadcast(
                change.members,
                &RoomEvent::PlaylistUpdated(change.outcome.clone()),
            )
            .await?;
        Ok(change.outcome)
    }
}
