//! UseCase 層のエラー型
//!
//! どのエラーもクライアントには返さず、UI 層でログに記録して処理を打ち切ります。

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError};

/// 参加・退出・ミュート通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// プレイリスト操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// 再生同期のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Push(#[from] MessagePushError),

    #[error("connection '{0}' is not in any room")]
    NotInRoom(String),

    #[error("no other member in room '{0}' can report the playback position")]
    NoSyncSource(String),
}

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// シグナリングのリレーのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("signal target '{0}' is not connected")]
    TargetNotFound(String),

    #[error(transparent)]
    Push(MessagePushError),
}

impl From<MessagePushError> for RelayError {
    fn from(error: MessagePushError) -> Self {
        match error {
            MessagePushError::ClientNotFound(id) => RelayError::TargetNotFound(id),
            other => RelayError::Push(other),
        }
    }
}

/// Room 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}
