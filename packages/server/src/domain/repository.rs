//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 1 つの Room に対する変更はすべて直列化され、途中状態が読み手に見えることはありません。
//! 変更の通知も同じ順番で送られるよう、変更ごとに [`DeliveryTurn`] が渡されます。

use std::fmt;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::{
    ChatEntry, ConnectionId, PlaybackAction, PlaybackView, PlaylistView, RepositoryError, Room,
    RoomId, RoomMember, VideoRef,
};

/// Room ごとの通知の順番札
///
/// 変更と同じロック区間で取得されます。これを持っている間、同じ Room の次の変更は
/// 通知の順番を待つため、参加者には変更が起きた順にイベントが届きます。
/// 通知を送り終えたら drop するか [`DeliveryTurn::finish`] で手放します。
/// 順番札を持ったまま同じ Room を変更してはいけません。
#[derive(Default)]
pub struct DeliveryTurn(Option<OwnedMutexGuard<()>>);

impl DeliveryTurn {
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self(Some(guard))
    }

    /// 順番を次の変更に譲る
    pub fn finish(&mut self) {
        self.0 = None;
    }

    pub fn is_held(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for DeliveryTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeliveryTurn").field(&self.is_held()).finish()
    }
}

/// Room への変更結果と、変更時点の参加者
///
/// 参加者リストは変更と同じロック区間で取得されるため、通知対象の計算に使えます。
#[derive(Debug)]
pub struct RoomChange<T> {
    pub outcome: T,
    pub members: Vec<ConnectionId>,
    pub turn: DeliveryTurn,
}

/// 切断により Room から外れた記録
#[derive(Debug)]
pub struct Departure {
    pub room_id: RoomId,
    pub member: RoomMember,
    /// 削除後に残っている参加者（全体）
    pub remaining: Vec<RoomMember>,
    /// 空になった Room がストアから削除されたか
    pub room_removed: bool,
    pub turn: DeliveryTurn,
}

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を取得し、無ければ空の Room を作成する（冪等）
    async fn get_or_create(&self, room_id: &RoomId) -> Room;

    /// Room を取得
    async fn get(&self, room_id: &RoomId) -> Option<Room>;

    /// 全ての Room を取得
    async fn list(&self) -> Vec<Room>;

    /// Room に参加者を追加し、追加後のスナップショットを返す（Room が無ければ作成）
    async fn join(&self, room_id: &RoomId, member: RoomMember) -> RoomChange<Room>;

    /// 全ての Room から接続を外す
    ///
    /// 複数の Room から外れる場合、順番札は RoomId の昇順に取得される。
    async fn leave(&self, connection_id: &ConnectionId) -> Vec<Departure>;

    /// 接続が参加している Room を取得
    async fn find_room_of(&self, connection_id: &ConnectionId) -> Option<Room>;

    async fn append_to_playlist(
        &self,
        room_id: &RoomId,
        video: VideoRef,
    ) -> Result<RoomChange<PlaylistView>, RepositoryError>;

    async fn remove_from_playlist(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<RoomChange<PlaylistView>, RepositoryError>;

    async fn set_current_index(
        &self,
        room_id: &RoomId,
        index: usize,
    ) -> Result<RoomChange<PlaybackView>, RepositoryError>;

    async fn apply_playback(
        &self,
        room_id: &RoomId,
        action: PlaybackAction,
    ) -> Result<RoomChange<PlaybackView>, RepositoryError>;

    async fn append_message(
        &self,
        room_id: &RoomId,
        entry: ChatEntry,
    ) -> Result<RoomChange<ChatEntry>, RepositoryError>;

    /// Room の参加者リストを取得
    async fn members(&self, room_id: &RoomId) -> Result<Vec<RoomMember>, RepositoryError>;
}
