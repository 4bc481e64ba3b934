//! ドメイン層
//!
//! Room の状態と不変条件、および外部（ストア・送信手段）とのインターフェースを定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod request;
pub mod value_object;

pub use entity::{ChatEntry, PlaybackAction, PlaybackView, PlaylistView, Room, RoomMember};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use event::{RoomEvent, SignalKind};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{DeliveryTurn, Departure, RoomChange, RoomRepository};
pub use request::RoomRequest;
pub use value_object::{
    ConnectionId, ConnectionIdFactory, MessageBody, PlaybackTime, RoomId, Timestamp, Username,
    VideoRef,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
