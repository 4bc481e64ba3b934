//! UseCase: 退出処理
//!
//! 切断した接続を全ての Room から外し、残った参加者に新しい参加者リストを通知します。
//! どの Room にもいない接続の退出は何も通知しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, MessagePusher, RoomEvent, RoomRepository};

/// 退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続の切断時に呼ばれる。送信先の登録も解除する
    pub async fn execute(&self, connection_id: &ConnectionId) -> Vec<Departure> {
        let mut departures = self.repository.leave(connection_id).await;
        announce_departures(self.message_pusher.as_ref(), &mut departures).await;
        self.message_pusher.unregister_client(connection_id).await;
        departures
    }
}

/// 退出した Room ごとに、残った参加者へ `user_left` を送り、その Room の順番札を手放す
pub(crate) async fn announce_departures(
    pusher: &dyn MessagePusher,
    departures: &mut [Departure],
) {
    for departure in departures.iter_mut() {
        tracing::info!(
            "'{}' ({}) left room '{}' ({} remaining{})",
            departure.member.username,
            departure.member.connection_id,
            departure.room_id,
            departure.remaining.len(),
            if departure.room_removed {
                ", room removed"
            } else {
                ""
            }
        );
        if departure.remaining.is_empty() {
            departure.turn.finish();
            continue;
        }

        let targets = departure
            .remaining
            .iter()
            .map(|member| member.connection_id.clone())
            .collect();
        let event = RoomEvent::UserLeft {
            username: departure.member.username.clone(),
            users: departure.remaining.clone(),
        };
        if let Err(e) = pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to announce departure: {}", e);
        }
        departure.turn.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockMessagePusher;
    use crate::usecase::testing::{connection, pusher_with, repository, room_id, seat};

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        // テスト項目: 退出すると残った参加者に新しい参加者リストが届く
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice"), ("c2", "bob")]).await;
        let (pusher, mut inboxes) = pusher_with(&["c1", "c2"]).await;
        let usecase = LeaveRoomUseCase::new(repository.clone(), pusher);

        // when (操作):
        let departures = usecase.execute(&connection("c1")).await;

        // then (期待する結果):
        assert_eq!(departures.len(), 1);
        let events = inboxes.drain("c2");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "user_left");
        assert_eq!(events[0]["data"]["username"], "alice");
        assert_eq!(
            events[0]["data"]["users"],
            serde_json::json!([{"id": "c2", "username": "bob"}])
        );
        // 退出した本人には何も送らない
        assert!(inboxes.drain("c1").is_empty());
    }

    #[tokio::test]
    async fn test_leave_unknown_connection_emits_nothing() {
        // テスト項目: どの Room にもいない接続の退出は何もブロードキャストしない
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice")]).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        pusher.expect_push_to().never();
        pusher
            .expect_unregister_client()
            .times(1)
            .returning(|_| ());
        let usecase = LeaveRoomUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let departures = usecase.execute(&connection("stranger")).await;

        // then (期待する結果):
        assert!(departures.is_empty());
        assert_eq!(
            repository.get(&room_id("R")).await.unwrap().users.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_last_member_leaving_keeps_room() {
        // テスト項目: 最後の参加者が抜けても Room と状態は残る
        // given (前提条件):
        let repository = repository();
        seat(&repository, "R", &[("c1", "alice")]).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        pusher.expect_unregister_client().returning(|_| ());
        let usecase = LeaveRoomUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let departures = usecase.execute(&connection("c1")).await;

        // then (期待する結果):
        assert_eq!(departures.len(), 1);
        assert!(!departures[0].room_removed);
        let room = repository.get(&room_id("R")).await.unwrap();
        assert!(room.users.is_empty());
    }
}
