//! UseCase テスト用のヘルパー
//!
//! 実際の InMemoryRoomRepository とチャンネル付きの WebSocketMessagePusher を組み合わせ、
//! 各接続に届いた JSON を取り出して検証します。

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomEvent, RoomId,
        RoomMember, RoomRepository, Username, VideoRef,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, RoomPolicy},
    },
};

pub fn connection(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub fn room_id(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub fn username(name: &str) -> Username {
    Username::new(name.to_string()).unwrap()
}

pub fn video(url: &str) -> VideoRef {
    VideoRef::new(url.to_string()).unwrap()
}

pub fn repository() -> Arc<InMemoryRoomRepository> {
    Arc::new(InMemoryRoomRepository::new(RoomPolicy::default()))
}

/// 接続ごとの受信口
pub struct Inboxes {
    receivers: HashMap<String, mpsc::UnboundedReceiver<String>>,
}

impl Inboxes {
    /// これまでに届いたイベントを取り出す（待たない）
    pub fn drain(&mut self, id: &str) -> Vec<serde_json::Value> {
        let receiver = self.receivers.get_mut(id).unwrap();
        let mut events = Vec::new();
        while let Ok(text) = receiver.try_recv() {
            events.push(serde_json::from_str(&text).unwrap());
        }
        events
    }

    /// これまでに届いたイベント名
    pub fn names(&mut self, id: &str) -> Vec<String> {
        self.drain(id)
            .into_iter()
            .map(|event| event["event"].as_str().unwrap().to_string())
            .collect()
    }
}

/// 届いたイベントのうち、data に `field` を持つ最後のものの値
pub fn last_field(events: &[serde_json::Value], field: &str) -> Option<serde_json::Value> {
    events
        .iter()
        .rev()
        .find_map(|event| event["data"].get(field).cloned())
}

/// 参加者リストの JSON 表現
pub fn roster_json(members: &[RoomMember]) -> serde_json::Value {
    members
        .iter()
        .map(|member| {
            serde_json::json!({
                "id": member.connection_id.as_str(),
                "username": member.username.as_str(),
            })
        })
        .collect()
}

/// 指定した接続をすべて登録した pusher を作る
pub async fn pusher_with(ids: &[&str]) -> (Arc<WebSocketMessagePusher>, Inboxes) {
    let pusher = Arc::new(WebSocketMessagePusher::default());
    let mut receivers = HashMap::new();
    for id in ids {
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_client(connection(id), tx).await;
        receivers.insert(id.to_string(), rx);
    }
    (pusher, Inboxes { receivers })
}

/// 通知を経由せずに参加者を Room に入れる
pub async fn seat(repository: &InMemoryRoomRepository, room: &str, members: &[(&str, &str)]) {
    for (id, name) in members {
        repository
            .join(&room_id(room), RoomMember::new(connection(id), username(name)))
            .await;
    }
}

/// 条件に合う最初の broadcast だけを遅らせる pusher（遅い書き込み先の再現）
pub struct StallingPusher {
    inner: Arc<dyn MessagePusher>,
    stall: Box<dyn Fn(&RoomEvent) -> bool + Send + Sync>,
    delay: Duration,
    stalled: AtomicBool,
}

impl StallingPusher {
    pub fn new(
        inner: Arc<dyn MessagePusher>,
        delay: Duration,
        stall: impl Fn(&RoomEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            stall: Box::new(stall),
            delay,
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MessagePusher for StallingPusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.inner.register_client(connection_id, sender).await;
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.inner.unregister_client(connection_id).await;
    }

    async fn push_to(
        &self,
        target: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        self.inner.push_to(target, event).await
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        if (self.stall)(event) && !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.broadcast(targets, event).await
    }
}
