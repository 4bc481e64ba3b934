//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## ロックの粒度
//!
//! ```text
//! RwLock<HashMap<RoomId, Arc<RoomSlot>>>
//!   └ 外側: Room の検索・作成・削除のときだけ取る
//!   └ RoomSlot.room: 1 つの Room への変更はこの Mutex の中で完結する
//!   └ RoomSlot.outbox: 変更の通知の順番札。room のロック中に取得する
//! ```
//!
//! 別々の Room への操作は並行して進み、同じ Room への操作は直列化されます。
//! outbox は room のロックを持ったまま待つので、通知の順番は変更の順番と一致します。
//! 順番札を複数持つのは `leave` だけで、RoomId の昇順に取得します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use tandem_shared::time::{Clock, SystemClock};

use crate::domain::{
    ChatEntry, ConnectionId, DeliveryTurn, Departure, PlaybackAction, PlaybackView, PlaylistView,
    RepositoryError, Room, RoomChange, RoomId, RoomMember, RoomRepository, Timestamp, VideoRef,
};

/// 空になった Room の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    /// `true` なら参加者が 0 人になっても Room を残す（再読み込みで状態が戻る）
    pub retain_empty_rooms: bool,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            retain_empty_rooms: true,
        }
    }
}

struct RoomSlot {
    room: Mutex<Room>,
    outbox: Arc<Mutex<()>>,
}

impl RoomSlot {
    fn new(room: Room) -> Self {
        Self {
            room: Mutex::new(room),
            outbox: Arc::new(Mutex::new(())),
        }
    }

    /// 呼び出し側は room のロックを持っていること
    async fn next_turn(&self) -> DeliveryTurn {
        DeliveryTurn::new(self.outbox.clone().lock_owned().await)
    }
}

type SharedRoom = Arc<RoomSlot>;

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, SharedRoom>>,
    policy: RoomPolicy,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(policy: RoomPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// 作成時刻の採番に使う Clock を指定して作成
    pub fn with_clock(policy: RoomPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> RoomPolicy {
        self.policy
    }

    async fn find(&self, room_id: &RoomId) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    async fn find_or_create(&self, room_id: &RoomId) -> SharedRoom {
        if let Some(room) = self.find(room_id).await {
            return room;
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_id);
                Arc::new(RoomSlot::new(Room::new(
                    room_id.clone(),
                    Timestamp::new(self.clock.now_millis()),
                )))
            })
            .clone()
    }

    async fn require(&self, room_id: &RoomId) -> Result<SharedRoom, RepositoryError> {
        self.find(room_id)
            .await
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))
    }

    /// Room のロック内で変更を適用し、同じロック区間の参加者リストと順番札を添えて返す
    async fn mutate<T, F>(&self, room_id: &RoomId, f: F) -> Result<RoomChange<T>, RepositoryError>
    where
        F: FnOnce(&mut Room) -> Result<T, RepositoryError> + Send,
        T: Send,
    {
        let shared = self.require(room_id).await?;
        let mut room = shared.room.lock().await;
        let outcome = f(&mut room)?;
        let turn = shared.next_turn().await;
        Ok(RoomChange {
            outcome,
            members: room.member_ids(),
            turn,
        })
    }

    async fn is_registered(&self, room_id: &RoomId, shared: &SharedRoom) -> bool {
        self.rooms
            .read()
            .await
            .get(room_id)
            .is_some_and(|current| Arc::ptr_eq(current, shared))
    }

    async fn all_rooms(&self) -> Vec<SharedRoom> {
        self.rooms.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(RoomPolicy::default())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, room_id: &RoomId) -> Room {
        let shared = self.find_or_create(room_id).await;
        let room = shared.room.lock().await;
        room.clone()
    }

    async fn get(&self, room_id: &RoomId) -> Option<Room> {
        let shared = self.find(room_id).await?;
        let room = shared.room.lock().await;
        Some(room.clone())
    }

    async fn list(&self) -> Vec<Room> {
        let mut snapshots = Vec::new();
        for shared in self.all_rooms().await {
            snapshots.push(shared.room.lock().await.clone());
        }
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    async fn join(&self, room_id: &RoomId, member: RoomMember) -> RoomChange<Room> {
        loop {
            let shared = self.find_or_create(room_id).await;
            let mut room = shared.room.lock().await;
            // leave() が空の Room を削除した直後に掴んだ場合は作り直す
            if !self.policy.retain_empty_rooms && !self.is_registered(room_id, &shared).await {
                continue;
            }
            room.add_member(member.clone());
            let turn = shared.next_turn().await;
            return RoomChange {
                outcome: room.clone(),
                members: room.member_ids(),
                turn,
            };
        }
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Vec<Departure> {
        let mut memberships = Vec::new();
        for shared in self.all_rooms().await {
            let room = shared.room.lock().await;
            if room.is_member(connection_id) {
                memberships.push((room.id.clone(), shared.clone()));
            }
        }
        memberships.sort_by(|a, b| a.0.cmp(&b.0));

        let mut departures = Vec::new();
        for (_, shared) in memberships {
            let mut room = shared.room.lock().await;
            let Some(member) = room.remove_member(connection_id) else {
                continue;
            };
            let room_removed = !self.policy.retain_empty_rooms && room.users.is_empty();
            if room_removed {
                self.rooms.write().await.remove(&room.id);
                tracing::info!("Room '{}' removed (empty)", room.id);
            }
            let turn = shared.next_turn().await;
            departures.push(Departure {
                room_id: room.id.clone(),
                member,
                remaining: room.users.clone(),
                room_removed,
                turn,
            });
        }
        departures
    }

    async fn find_room_of(&self, connection_id: &ConnectionId) -> Option<Room> {
        for shared in self.all_rooms().await {
            let room = shared.room.lock().await;
            if room.is_member(connection_id) {
                return Some(room.clone());
            }
        }
        None
    }

    async fn append_to_playlist(
        &self,
        room_id: &RoomId,
        video: VideoRef,
    ) -> Result<RoomChange<PlaylistView>, RepositoryError> {
        self.mutate(room_id, move |room| Ok(room.append_video(video))).await
    }

    async fn remove_from_playlist(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<RoomChange<PlaylistView>, RepositoryError> {
        self.mutate(room_id, move |room| room.remove_video(index)).await
    }

    async fn set_current_index(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<RoomChange<PlaybackView>, RepositoryError> {
        self.mutate(room_id, move |room| room.change_video(index)).await
    }

    async fn apply_playback(
        &self,
        room_id: &RoomId,
        action: PlaybackAction,
    ) -> Result<RoomChange<PlaybackView>, RepositoryError> {
        self.mutate(room_id, move |room| Ok(room.apply_playback(action))).await
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        entry: ChatEntry,
    ) -> Result<RoomChange<ChatEntry>, RepositoryError> {
        self.mutate(room_id, move |room| {
            room.append_message(entry.clone());
            Ok(entry)
        })
        .await
    }

    async fn members(&self, room_id: &RoomId) -> Result<Vec<RoomMember>, RepositoryError> {
        let shared = self.require(room_id).await?;
        let room = shared.room.lock().await;
        Ok(room.users.clone())
    }
}
