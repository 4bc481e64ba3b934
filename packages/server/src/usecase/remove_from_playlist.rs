//! UseCase: プレイリストからの削除

use std::sync::Arc;

use crate::domain::{MessagePusher, PlaylistView, RoomEvent, RoomId, RoomRepository};

use super::error::PlaylistError;

pub struct RemoveFromPlaylistUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RemoveFromPlaylistUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 範囲外の index なら Room は変わらず、何も送らない
    pub async fn execute(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<PlaylistView, PlaylistError> {
        let change = self.repository.remove_from_playlist(room_id, index).await?;
        self.message_pusher
            .broadcast(
                change.members,
                &RoomEvent::PlaylistUpdated(change.outcome.clone()),
            )
            .await?;
        Ok(change.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockMessagePusher, RepositoryError};
    use crate::usecase::testing::{pusher_with, repository, room_id, seat, video};

    #[tokio::test]
    async fn test_remove_clamps_current_index() {
        // テスト項目: 再生中の末尾の動画を削除すると currentIndex が末尾に寄せられて通知される
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice")]).await;
        repository.append_to_playlist(&room_id("R"), video("a")).await.unwrap();
        repository.append_to_playlist(&room_id("R"), video("b")).await.unwrap();
        repository.set_current_index(&room_id("R"), 1).await.unwrap();
        let (pusher, mut inboxes) = pusher_with(&["c1"]).await;
        let usecase = RemoveFromPlaylistUseCase::new(repository.clone(), pusher);

        // when (操作):
        let view = usecase.execute(&room_id("R"), 1).await.unwrap();

        // then (期待する結果):
        assert_eq!(view.playlist, vec![video("a")]);
        assert_eq!(view.current_index, 0);
        let events = inboxes.drain("c1");
        assert_eq!(
            events[0]["data"],
            serde_json::json!({"playlist": ["a"], "currentIndex": 0})
        );
    }

    #[tokio::test]
    async fn test_remove_out_of_range_sends_nothing() {
        // テスト項目: 範囲外の削除は Room を変えず、誰にも通知しない
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice")]).await;
        repository.append_to_playlist(&room_id("R"), video("a")).await.unwrap();
        let before = repository.get(&room_id("R")).await.unwrap();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = RemoveFromPlaylistUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let result = usecase.execute(&room_id("R"), 5).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(PlaylistError::Repository(RepositoryError::IndexOutOfRange {
                index: 5,
                len: 1
            }))
        );
        assert_eq!(repository.get(&room_id("R")).await.unwrap(), before);
    }
}
