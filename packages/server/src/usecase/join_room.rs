//! UseCase: Room への参加
//!
//! 参加者には Room 全体のスナップショットを、他の参加者には新しい参加者リストを送ります。
//! 既に誰かがいる Room では、最も古い参加者に現在の再生位置を報告させます（遅れて参加した
//! 接続は、サーバーが持つ古い `currentTime` ではなく実際の再生位置に追いつく）。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, Room, RoomEvent, RoomId, RoomMember, RoomRepository, Username,
};

use super::{error::MembershipError, leave_room::announce_departures};

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 参加を実行し、参加後のスナップショットを返す
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        username: Username,
    ) -> Result<Room, MembershipError> {
        // 1 接続が参加できる Room は 1 つだけ
        let mut departures = self.repository.leave(&connection_id).await;
        announce_departures(self.message_pusher.as_ref(), &mut departures).await;
        // 同じ Room への再参加は退出の順番札が手放されるのを待つ
        drop(departures);

        let member = RoomMember::new(connection_id.clone(), username.clone());
        // 参加者リストの配信が終わるまで、この Room の次の変更は通知されない
        let joined = self.repository.join(&room_id, member).await;
        let room = &joined.outcome;
        tracing::info!(
            "'{}' ({}) joined room '{}' ({} users)",
            username,
            connection_id,
            room_id,
            room.users.len()
        );

        self.message_pusher
            .push_to(&connection_id, &RoomEvent::RoomState(room.clone()))
            .await?;

        self.message_pusher
            .broadcast(
                room.member_ids_except(&connection_id),
                &RoomEvent::UserJoined {
                    username,
                    users: room.users.clone(),
                },
            )
            .await?;

        if let Some(source) = room.sync_source_for(&connection_id) {
            let request = RoomEvent::RequestSync {
                requester_id: connection_id.clone(),
            };
            if let Err(e) = self.message_pusher.push_to(&source, &request).await {
                // 報告が来なければ参加者はスナップショットのまま再生する
                tracing::debug!("Late-join sync request to '{}' dropped: {}", source, e);
            }
        }

        Ok(joined.outcome)
    }
}
