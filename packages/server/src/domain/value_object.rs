//! Value Object 定義
//!
//! ワイヤ上の生の文字列・数値を検証済みの型に変換します。
//! Room Store に到達する値はすべてここを通過しています。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

const ROOM_ID_MAX_LEN: usize = 128;
const USERNAME_MAX_LEN: usize = 64;
const VIDEO_REF_MAX_LEN: usize = 2048;
const MESSAGE_BODY_MAX_LEN: usize = 2000;

/// 空白除去・空チェック・最大長チェックを行う共通処理
fn validated(
    field: &'static str,
    value: String,
    max_len: usize,
) -> Result<String, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(ValueObjectError::TooLong {
            field,
            max: max_len,
            actual: len,
        });
    }
    Ok(trimmed.to_string())
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validated($field, value, $max).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// 呼び出し側が指定する Room のキー
    RoomId,
    "room_id",
    ROOM_ID_MAX_LEN
);

string_value_object!(
    /// 接続ごとに一意な ID（サーバーが採番する）
    ConnectionId,
    "connection_id",
    ROOM_ID_MAX_LEN
);

string_value_object!(
    /// 表示名。接続をまたいで重複してよい
    Username,
    "username",
    USERNAME_MAX_LEN
);

string_value_object!(
    /// プレイリストの 1 項目（動画 URL などの参照文字列）
    VideoRef,
    "video_url",
    VIDEO_REF_MAX_LEN
);

/// チャット本文
///
/// 空白のみの本文は拒否しますが、前後の空白以外は送信されたまま保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validated("message", value, MESSAGE_BODY_MAX_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 再生位置（秒）。有限かつ 0 以上
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct PlaybackTime(f64);

impl PlaybackTime {
    pub const ZERO: PlaybackTime = PlaybackTime(0.0);

    pub fn new(seconds: f64) -> Result<Self, ValueObjectError> {
        if !seconds.is_finite() {
            return Err(ValueObjectError::NotFinite);
        }
        if seconds < 0.0 {
            return Err(ValueObjectError::Negative(seconds));
        }
        Ok(Self(seconds))
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for PlaybackTime {
    type Error = ValueObjectError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// ConnectionId の採番
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 で新しい ConnectionId を生成
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_is_trimmed() {
        // テスト項目: RoomId の前後の空白が除去される
        // given (前提条件):
        let raw = "  movie-night  ".to_string();

        // when (操作):
        let room_id = RoomId::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(room_id.as_str(), "movie-night");
    }

    #[test]
    fn test_empty_values_are_rejected() {
        // テスト項目: 空文字・空白のみの値は拒否される
        // given (前提条件):
        let blank = "   ".to_string();

        // when (操作):
        let room = RoomId::new(blank.clone());
        let user = Username::new(String::new());
        let body = MessageBody::new(blank);

        // then (期待する結果):
        assert_eq!(room, Err(ValueObjectError::Empty("room_id")));
        assert_eq!(user, Err(ValueObjectError::Empty("username")));
        assert_eq!(body, Err(ValueObjectError::Empty("message")));
    }

    #[test]
    fn test_username_too_long_is_rejected() {
        // テスト項目: 最大長を超える Username は拒否される
        // given (前提条件):
        let raw = "a".repeat(USERNAME_MAX_LEN + 1);

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::TooLong {
                field: "username",
                max: USERNAME_MAX_LEN,
                actual: USERNAME_MAX_LEN + 1,
            })
        );
    }

    #[test]
    fn test_playback_time_rejects_nan_and_negative() {
        // テスト項目: NaN・無限大・負の値の再生位置は拒否される
        // given / when (操作):
        let nan = PlaybackTime::new(f64::NAN);
        let inf = PlaybackTime::new(f64::INFINITY);
        let negative = PlaybackTime::new(-1.5);
        let ok = PlaybackTime::new(42.25);

        // then (期待する結果):
        assert_eq!(nan, Err(ValueObjectError::NotFinite));
        assert_eq!(inf, Err(ValueObjectError::NotFinite));
        assert_eq!(negative, Err(ValueObjectError::Negative(-1.5)));
        assert_eq!(ok.unwrap().seconds(), 42.25);
    }

    #[test]
    fn test_connection_id_factory_generates_unique_ids() {
        // テスト項目: 採番される ConnectionId は毎回異なる
        // when (操作):
        let a = ConnectionIdFactory::generate();
        let b = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }
}
