//! UseCase: 通話確立のためのシグナリング中継
//!
//! offer / answer / ice-candidate を宛先の接続にだけ届けます。`callerId` は
//! クライアントの申告ではなく、常に実際の送信元の接続 ID です。
//! 宛先が見つからない場合の配送は保証しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomEvent, SignalKind};

use super::error::RelayError;

pub struct RelaySignalUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub async fn execute(
        &self,
        sender: &ConnectionId,
        kind: SignalKind,
        target: &ConnectionId,
        payload: serde_json::Value,
    ) -> Result<(), RelayError> {
        let event = RoomEvent::Signal {
            kind,
            payload,
            caller_id: sender.clone(),
        };
        self.message_pusher.push_to(target, &event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessagePushError, MockMessagePusher};
    use crate::usecase::testing::{connection, pusher_with};
    use serde_json::json;

    #[tokio::test]
    async fn test_relay_tags_sender_as_caller() {
        // テスト項目: シグナリングは宛先にだけ、送信元の callerId 付きで届く
        // given (前提条件):
        let (pusher, mut inboxes) = pusher_with(&["c1", "c2", "c3"]).await;
        let usecase = RelaySignalUseCase::new(pusher);

        // when (操作):
        usecase
            .execute(
                &connection("c1"),
                SignalKind::Answer,
                &connection("c2"),
                json!({"type": "answer", "sdp": "v=0"}),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            inboxes.drain("c2"),
            vec![json!({
                "event": "answer",
                "data": {"payload": {"type": "answer", "sdp": "v=0"}, "callerId": "c1"}
            })]
        );
        assert!(inboxes.drain("c1").is_empty());
        assert!(inboxes.drain("c3").is_empty());
    }

    #[tokio::test]
    async fn test_relay_to_unknown_target_reports_target_not_found() {
        // テスト項目: 宛先が見つからない場合は TargetNotFound になる
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .times(1)
            .returning(|target, _| Err(MessagePushError::ClientNotFound(target.to_string())));
        let usecase = RelaySignalUseCase::new(Arc::new(pusher));

        // when (操作):
        let result = usecase
            .execute(
                &connection("c1"),
                SignalKind::IceCandidate,
                &connection("gone"),
                json!({"candidate": "c"}),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::TargetNotFound("gone".to_string())));
    }
}
