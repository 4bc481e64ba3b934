//! UseCase: Room 一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// Room ID 順に全ての Room を返す
    pub async fn execute(&self) -> Vec<Room> {
        self.repository.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{repository, seat};

    #[tokio::test]
    async fn test_get_rooms_lists_all_rooms() {
        // テスト項目: 作成された全ての Room が ID 順に取得できる
        // given (前提条件):
        let repository = repository();
        seat(&repository, "beta", &[("c1", "alice")]).await;
        seat(&repository, "alpha", &[("c2", "bob")]).await;
        let usecase = GetRoomsUseCase::new(repository.clone());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|room| room.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_get_rooms_empty() {
        // テスト項目: Room が無ければ空のリストを返す
        // given (前提条件):
        let usecase = GetRoomsUseCase::new(repository());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        assert!(rooms.is_empty());
    }
}
