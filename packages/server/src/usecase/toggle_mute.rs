//! UseCase: ミュート状態の通知

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomEvent, RoomId, RoomRepository};

use super::error::MembershipError;

pub struct ToggleMuteUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ToggleMuteUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 送信者以外の参加者に `user_muted` を送る。Room の状態は変えない
    pub async fn execute(
        &self,
        sender: &ConnectionId,
        room_id: &RoomId,
        is_muted: bool,
    ) -> Result<(), MembershipError> {
        let targets = self
            .repository
            .members(room_id)
            .await?
            .into_iter()
            .map(|member| member.connection_id)
            .filter(|id| id != sender)
            .collect();
        let event = RoomEvent::UserMuted {
            user_id: sender.clone(),
            is_muted,
        };
        self.message_pusher.broadcast(targets, &event).await?;
        Ok(())
    }
}
