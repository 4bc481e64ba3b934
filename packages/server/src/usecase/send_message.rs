//! UseCase: チャット送信
//!
//! メッセージにはサーバーの時計でタイムスタンプを付け、Room の履歴に追加してから
//! 送信者を含む全員に届けます。

use std::sync::Arc;

use tandem_shared::time::Clock;

use crate::domain::{
    ChatEntry, MessageBody, MessagePusher, RoomEvent, RoomId, RoomRepository, Timestamp, Username,
};

use super::error::ChatError;

/// チャット送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// # Returns
    ///
    /// * `Ok(ChatEntry)` - 履歴に追加されたメッセージ
    /// * `Err(ChatError)` - Room が存在しない、または通知に失敗した
    pub async fn execute(
        &self,
        room_id: &RoomId,
        username: Username,
        message: MessageBody,
    ) -> Result<ChatEntry, ChatError> {
        let entry = ChatEntry::new(username, message, Timestamp::new(self.clock.now_millis()));
        let change = self.repository.append_message(room_id, entry).await?;
        self.message_pusher
            .broadcast(
                change.members,
                &RoomEvent::ChatMessage(change.outcome.clone()),
            )
            .await?;
        Ok(change.outcome)
    }
}
