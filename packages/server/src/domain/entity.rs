//! Entity 定義
//!
//! `Room` は 1 つの共有再生セッション（プレイリスト・再生状態・参加者・チャット）です。
//! ここにあるメソッドはすべて同期的な純粋ロジックで、排他制御は Repository 側が担います。

use super::{
    error::RepositoryError,
    value_object::{ConnectionId, MessageBody, PlaybackTime, RoomId, Timestamp, Username, VideoRef},
};

/// Room の参加者（接続 1 本につき 1 エントリ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub connection_id: ConnectionId,
    pub username: Username,
}

impl RoomMember {
    pub fn new(connection_id: ConnectionId, username: Username) -> Self {
        Self {
            connection_id,
            username,
        }
    }
}

/// チャット履歴の 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub username: Username,
    pub message: MessageBody,
    pub timestamp: Timestamp,
}

impl ChatEntry {
    pub fn new(username: Username, message: MessageBody, timestamp: Timestamp) -> Self {
        Self {
            username,
            message,
            timestamp,
        }
    }
}

/// クライアントのプレイヤーから発生した再生操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackAction {
    Play { at: PlaybackTime },
    Pause { at: PlaybackTime },
    Seek {
        at: PlaybackTime,
        is_playing: Option<bool>,
    },
}

impl PlaybackAction {
    pub fn at(&self) -> PlaybackTime {
        match self {
            PlaybackAction::Play { at }
            | PlaybackAction::Pause { at }
            | PlaybackAction::Seek { at, .. } => *at,
        }
    }
}

/// プレイリスト変更後の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistView {
    pub playlist: Vec<VideoRef>,
    pub current_index: usize,
}

/// 動画切り替え・再生操作後の再生状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackView {
    pub current_index: usize,
    pub current_time: PlaybackTime,
    pub is_playing: bool,
    /// この変更に割り当てられたシーケンス番号
    pub seq: u64,
}

/// 共有再生セッション
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub playlist: Vec<VideoRef>,
    /// プレイリストが空でない限り `0 <= current_index < playlist.len()`
    pub current_index: usize,
    pub is_playing: bool,
    pub current_time: PlaybackTime,
    pub users: Vec<RoomMember>,
    pub messages: Vec<ChatEntry>,
    /// play / pause / seek / change_video のたびに 1 ずつ増える
    pub seq: u64,
    pub created_at: Timestamp,
}

impl Room {
    /// 空の Room を作成（プレイリスト空・停止中・位置 0）
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            playlist: Vec::new(),
            current_index: 0,
            is_playing: false,
            current_time: PlaybackTime::ZERO,
            users: Vec::new(),
            messages: Vec::new(),
            seq: 0,
            created_at,
        }
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.users
            .iter()
            .any(|member| &member.connection_id == connection_id)
    }

    /// 参加者を末尾に追加（同じ接続が既にいれば置き換えずに何もしない）
    pub fn add_member(&mut self, member: RoomMember) {
        if self.is_member(&member.connection_id) {
            return;
        }
        self.users.push(member);
    }

    /// 参加者を削除し、削除したエントリを返す
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> Option<RoomMember> {
        let position = self
            .users
            .iter()
            .position(|member| &member.connection_id == connection_id)?;
        Some(self.users.remove(position))
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.users
            .iter()
            .map(|member| member.connection_id.clone())
            .collect()
    }

    pub fn member_ids_except(&self, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.users
            .iter()
            .filter(|member| &member.connection_id != exclude)
            .map(|member| member.connection_id.clone())
            .collect()
    }

    /// 遅れて参加した `requester` のために現在位置を報告させる相手を選ぶ
    ///
    /// 参加順で最も古い、`requester` 以外の参加者。
    pub fn sync_source_for(&self, requester: &ConnectionId) -> Option<ConnectionId> {
        self.users
            .iter()
            .find(|member| &member.connection_id != requester)
            .map(|member| member.connection_id.clone())
    }

    pub fn playlist_view(&self) -> PlaylistView {
        PlaylistView {
            playlist: self.playlist.clone(),
            current_index: self.current_index,
        }
    }

    pub fn playback_view(&self) -> PlaybackView {
        PlaybackView {
            current_index: self.current_index,
            current_time: self.current_time,
            is_playing: self.is_playing,
            seq: self.seq,
        }
    }

    pub fn append_video(&mut self, video: VideoRef) -> PlaylistView {
        self.playlist.push(video);
        self.playlist_view()
    }

    /// プレイリストから `index` の項目を削除
    ///
    /// 範囲外なら何も変更せずエラーを返す。削除後に `current_index` が
    /// 末尾を超える場合は末尾に寄せ、空になった場合は 0 に戻す。
    pub fn remove_video(&mut self, index: usize) -> Result<PlaylistView, RepositoryError> {
        if index >= self.playlist.len() {
            return Err(RepositoryError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.playlist.remove(index);
        match self.playlist.len() {
            0 => self.current_index = 0,
            len if self.current_index >= len => self.current_index = len - 1,
            _ => {}
        }
        Ok(self.playlist_view())
    }

    /// 再生中の動画を切り替える。切り替えた動画は常に先頭から再生される
    pub fn change_video(&mut self, index: usize) -> Result<PlaybackView, RepositoryError> {
        if index >= self.playlist.len() {
            return Err(RepositoryError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.current_index = index;
        self.current_time = PlaybackTime::ZERO;
        self.is_playing = true;
        self.seq += 1;
        Ok(self.playback_view())
    }

    /// play / pause / seek を再生状態に反映する
    pub fn apply_playback(&mut self, action: PlaybackAction) -> PlaybackView {
        match action {
            PlaybackAction::Play { at } => {
                self.is_playing = true;
                self.current_time = at;
            }
            PlaybackAction::Pause { at } => {
                self.is_playing = false;
                self.current_time = at;
            }
            PlaybackAction::Seek { at, is_playing } => {
                self.current_time = at;
                if let Some(is_playing) = is_playing {
                    self.is_playing = is_playing;
                }
            }
        }
        self.seq += 1;
        self.playback_view()
    }

    pub fn append_message(&mut self, entry: ChatEntry) {
        self.messages.push(entry);
    }
}
