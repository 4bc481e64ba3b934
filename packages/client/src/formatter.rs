//! Message formatting utilities for client display.

use tandem_server::infrastructure::dto::websocket::{ChatMessageDto, RoomStatePayload, UserDto};
use tandem_shared::time::timestamp_to_clock;

use crate::mesh::{LinkPhase, PeerLink, PeerRole};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// `mm:ss`, or `h:mm:ss` past the hour
    pub fn format_position(secs: f64) -> String {
        let total = secs.max(0.0) as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{:02}:{:02}", m, s)
        }
    }

    /// Snapshot shown right after joining: members, playlist and chat history
    pub fn format_room_state(
        room_id: &str,
        state: &RoomStatePayload,
        self_id: Option<&str>,
    ) -> String {
        let mut output = format!("\n{}\nRoom '{}'\n", RULE, room_id);
        output.push_str(&Self::format_users(&state.users, self_id));
        output.push_str(&Self::format_playlist(&state.playlist, state.current_index));
        output.push_str(&format!(
            "{} at {}\n",
            if state.is_playing { "Playing" } else { "Paused" },
            Self::format_position(state.current_time)
        ));
        for message in &state.messages {
            output.push_str(&Self::format_chat_line(message));
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    pub fn format_users(users: &[UserDto], self_id: Option<&str>) -> String {
        let mut output = String::from("Members:\n");
        for user in users {
            let me = if self_id == Some(user.id.as_str()) { " (me)" } else { "" };
            output.push_str(&format!("  {}{}\n", user.username, me));
        }
        output
    }

    pub fn format_playlist(playlist: &[String], current_index: usize) -> String {
        if playlist.is_empty() {
            return "Playlist: (empty)\n".to_string();
        }
        let mut output = String::from("Playlist:\n");
        for (i, url) in playlist.iter().enumerate() {
            let marker = if i == current_index { ">" } else { " " };
            output.push_str(&format!("{} {}. {}\n", marker, i, url));
        }
        output
    }

    fn format_chat_line(message: &ChatMessageDto) -> String {
        format!(
            "[{}] @{}: {}\n",
            timestamp_to_clock(message.timestamp),
            message.username,
            message.message
        )
    }

    pub fn format_chat_message(message: &ChatMessageDto) -> String {
        format!("\n{}", Self::format_chat_line(message))
    }

    pub fn format_user_joined(username: &str, member_count: usize) -> String {
        format!("\n+ {} joined ({} in room)\n", username, member_count)
    }

    pub fn format_user_left(username: &str, member_count: usize) -> String {
        format!("\n- {} left ({} in room)\n", username, member_count)
    }

    pub fn format_user_muted(username: &str, is_muted: bool) -> String {
        let state = if is_muted { "muted" } else { "unmuted" };
        format!("\n~ {} {}\n", username, state)
    }

    pub fn format_video_changed(index: usize, url: Option<&str>) -> String {
        format!("\n>> Now playing {}. {}\n", index, url.unwrap_or("(unknown)"))
    }

    /// Remote playback correction that moved the local player
    pub fn format_remote_sync(action: &str, at: f64) -> String {
        format!("\n>> {} at {}\n", action, Self::format_position(at))
    }

    pub fn format_peers(peers: &[(String, PeerLink)]) -> String {
        if peers.is_empty() {
            return "\n(No call links)\n".to_string();
        }
        let mut output = String::from("\nCall links:\n");
        for (id, link) in peers {
            let role = match link.role {
                PeerRole::Initiator => "initiator",
                PeerRole::Responder => "responder",
            };
            let phase = match link.phase {
                LinkPhase::OfferSent => "offer sent",
                LinkPhase::AnswerSent => "answer sent",
                LinkPhase::Connected => "connected",
            };
            output.push_str(&format!("  {} [{}, {}]\n", id, role, phase));
        }
        output
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, username: &str) -> UserDto {
        UserDto {
            id: id.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_format_position() {
        // テスト項目: 再生位置が mm:ss（1 時間以上は h:mm:ss）で表示される
        // given (前提条件):
        let positions = [0.0, 65.9, 3725.0, -3.0];

        // when (操作):
        let formatted: Vec<_> = positions
            .iter()
            .map(|p| MessageFormatter::format_position(*p))
            .collect();

        // then (期待する結果):
        assert_eq!(formatted, vec!["00:00", "01:05", "1:02:05", "00:00"]);
    }

    #[test]
    fn test_format_room_state_marks_me_and_current_item() {
        // テスト項目: Room のスナップショットで自分と再生中の項目に印が付く
        // given (前提条件):
        let state = RoomStatePayload {
            playlist: vec!["a.mp4".to_string(), "b.mp4".to_string()],
            current_index: 1,
            is_playing: true,
            current_time: 42.0,
            users: vec![user("c1", "alice"), user("c2", "bob")],
            messages: vec![ChatMessageDto {
                username: "alice".to_string(),
                message: "hi".to_string(),
                timestamp: 1672498800000,
            }],
            seq: 3,
        };

        // when (操作):
        let result = MessageFormatter::format_room_state("R", &state, Some("c2"));

        // then (期待する結果):
        assert!(result.contains("Room 'R'"));
        assert!(result.contains("bob (me)"));
        assert!(!result.contains("alice (me)"));
        assert!(result.contains("> 1. b.mp4"));
        assert!(result.contains("Playing at 00:42"));
        assert!(result.contains("[15:00:00] @alice: hi"));
    }

    #[test]
    fn test_format_empty_playlist() {
        // テスト項目: 空のプレイリストはその旨が表示される
        // given (前提条件):
        let playlist: Vec<String> = vec![];

        // when (操作):
        let result = MessageFormatter::format_playlist(&playlist, 0);

        // then (期待する結果):
        assert_eq!(result, "Playlist: (empty)\n");
    }

    #[test]
    fn test_format_roster_changes() {
        // テスト項目: 参加・退出・ミュート通知が正しくフォーマットされる
        // given (前提条件):
        let username = "carol";

        // when (操作):
        let joined = MessageFormatter::format_user_joined(username, 3);
        let left = MessageFormatter::format_user_left(username, 2);
        let muted = MessageFormatter::format_user_muted(username, true);

        // then (期待する結果):
        assert!(joined.contains("+ carol joined (3 in room)"));
        assert!(left.contains("- carol left (2 in room)"));
        assert!(muted.contains("~ carol muted"));
    }

    #[test]
    fn test_format_peers() {
        // テスト項目: 通話リンクの役割と状態が表示される
        // given (前提条件):
        let peers = vec![(
            "c9".to_string(),
            PeerLink {
                role: PeerRole::Responder,
                phase: LinkPhase::Connected,
            },
        )];

        // when (操作):
        let result = MessageFormatter::format_peers(&peers);

        // then (期待する結果):
        assert!(result.contains("c9 [responder, connected]"));
    }
}
