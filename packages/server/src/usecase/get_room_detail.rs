//! UseCase: Room 詳細の取得

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_id: &RoomId) -> Result<Room, GetRoomDetailError> {
        self.repository
            .get(room_id)
            .await
            .ok_or_else(|| GetRoomDetailError::RoomNotFound(room_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{repository, room_id, seat};

    #[tokio::test]
    async fn test_get_room_detail_found() {
        // テスト項目: 存在する Room の詳細が取得できる
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice")]).await;
        let usecase = GetRoomDetailUseCase::new(repository.clone());

        // when (操作):
        let room = usecase.execute(&room_id("R")).await.unwrap();

        // then (期待する結果):
        assert_eq!(room.id, room_id("R"));
        assert_eq!(room.users.len(), 1);
    }

    #[tokio::test]
    async fn test_get_room_detail_not_found() {
        // テスト項目: 存在しない Room は RoomNotFound になり、作成もされない
        // given (前提条件):
        let repository = repository();
        let usecase = GetRoomDetailUseCase::new(repository.clone());

        // when (操作):
        let result = usecase.execute(&room_id("missing")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GetRoomDetailError::RoomNotFound("missing".to_string()))
        );
        assert!(repository.get(&room_id("missing")).await.is_none());
    }
}
