//! Playback sync engine.
//!
//! Decides whether a remote sync instruction should move the local player, and keeps
//! the player events caused by such corrections from being sent back to the room.
//!
//! Every instruction carries the room's sequence number. Instructions older than the
//! last applied one are dropped, and each applied correction registers the events it
//! will make the player fire ("expected echoes"). A local event matching an expected
//! echo is swallowed; anything else is a genuine user action and is reported upstream.

use std::collections::VecDeque;

use tandem_server::infrastructure::dto::websocket::{
    ServerEvent, SyncActionData, SyncActionKind,
};

use crate::{
    config::DEFAULT_TOLERANCE_SECS,
    player::{LocalPlayback, PlayerCommand, PlayerEvent},
};

/// Positions closer than this are considered the same echo
const ECHO_EPSILON_SECS: f64 = 0.5;

/// Pending echoes kept at most; older ones are forgotten
const MAX_PENDING_ECHOES: usize = 16;

/// Remote playback instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncInstruction {
    Play {
        at: f64,
        seq: u64,
    },
    Pause {
        at: f64,
        seq: u64,
    },
    Seek {
        at: f64,
        is_playing: Option<bool>,
        seq: u64,
    },
}

impl SyncInstruction {
    pub fn seq(&self) -> u64 {
        match self {
            SyncInstruction::Play { seq, .. }
            | SyncInstruction::Pause { seq, .. }
            | SyncInstruction::Seek { seq, .. } => *seq,
        }
    }

    /// `sync_play` / `sync_pause` / `sync_seek` as an instruction
    pub fn from_server_event(event: &ServerEvent) -> Option<Self> {
        match event {
            ServerEvent::SyncPlay(p) => Some(SyncInstruction::Play {
                at: p.current_time,
                seq: p.seq,
            }),
            ServerEvent::SyncPause(p) => Some(SyncInstruction::Pause {
                at: p.current_time,
                seq: p.seq,
            }),
            ServerEvent::SyncSeek(p) => Some(SyncInstruction::Seek {
                at: p.current_time,
                is_playing: p.is_playing,
                seq: p.seq,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Older than an instruction already applied
    Stale,
    /// Already close enough to the instructed state
    WithinTolerance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncDecision {
    Apply(PlayerCommand),
    Ignore(IgnoreReason),
}

/// `sync_action` to send for a genuine local event
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundSync {
    pub action: SyncActionKind,
    pub data: SyncActionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoKind {
    Play,
    Pause,
    Seek,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ExpectedEcho {
    kind: EchoKind,
    at: f64,
    seq: u64,
}

impl ExpectedEcho {
    fn matches(&self, event: &PlayerEvent) -> bool {
        let (kind, at) = match *event {
            PlayerEvent::Played { at } => (EchoKind::Play, at),
            PlayerEvent::Paused { at } => (EchoKind::Pause, at),
            PlayerEvent::Seeked { at, .. } => (EchoKind::Seek, at),
        };
        self.kind == kind && (self.at - at).abs() < ECHO_EPSILON_SECS
    }
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    tolerance: f64,
    last_applied_seq: u64,
    expected: VecDeque<ExpectedEcho>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECS)
    }
}

impl SyncEngine {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            last_applied_seq: 0,
            expected: VecDeque::new(),
        }
    }

    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    pub fn pending_echoes(&self) -> usize {
        self.expected.len()
    }

    /// Forget everything; used when a fresh room snapshot arrives
    pub fn reset(&mut self) {
        self.last_applied_seq = 0;
        self.expected.clear();
    }

    pub fn on_remote(&mut self, instruction: SyncInstruction, local: LocalPlayback) -> SyncDecision {
        let seq = instruction.seq();
        if seq < self.last_applied_seq {
            tracing::debug!(
                "Dropping stale instruction (seq {} < {})",
                seq,
                self.last_applied_seq
            );
            return SyncDecision::Ignore(IgnoreReason::Stale);
        }
        self.last_applied_seq = seq;

        let command = match instruction {
            SyncInstruction::Play { at, .. } => {
                let in_tolerance = self.within_tolerance(local.position, at);
                if local.is_playing && in_tolerance {
                    return SyncDecision::Ignore(IgnoreReason::WithinTolerance);
                }
                PlayerCommand::Play {
                    seek_to: (!in_tolerance).then_some(at),
                }
            }
            SyncInstruction::Pause { at, .. } => {
                if !local.is_playing && self.within_tolerance(local.position, at) {
                    return SyncDecision::Ignore(IgnoreReason::WithinTolerance);
                }
                PlayerCommand::Pause { at }
            }
            // an explicit seek is always intentional
            SyncInstruction::Seek { at, is_playing, .. } => PlayerCommand::Seek {
                to: at,
                play: is_playing,
            },
        };

        self.expect_echoes(command, local, seq);
        SyncDecision::Apply(command)
    }

    /// `None` when the event is the echo of an applied correction
    pub fn on_local_event(&mut self, event: PlayerEvent) -> Option<OutboundSync> {
        if let Some(index) = self.expected.iter().position(|echo| echo.matches(&event)) {
            if let Some(echo) = self.expected.remove(index) {
                tracing::trace!("Suppressed echo of seq {}", echo.seq);
            }
            return None;
        }

        Some(match event {
            PlayerEvent::Played { at } => OutboundSync {
                action: SyncActionKind::Play,
                data: SyncActionData {
                    current_time: at,
                    is_playing: None,
                },
            },
            PlayerEvent::Paused { at } => OutboundSync {
                action: SyncActionKind::Pause,
                data: SyncActionData {
                    current_time: at,
                    is_playing: None,
                },
            },
            PlayerEvent::Seeked { at, is_playing } => OutboundSync {
                action: SyncActionKind::Seek,
                data: SyncActionData {
                    current_time: at,
                    is_playing: Some(is_playing),
                },
            },
        })
    }

    fn within_tolerance(&self, local: f64, target: f64) -> bool {
        (local - target).abs() < self.tolerance
    }

    /// Register the events `SimulatedPlayer::apply` (or a real element) fires for `command`
    fn expect_echoes(&mut self, command: PlayerCommand, local: LocalPlayback, seq: u64) {
        match command {
            PlayerCommand::Play { seek_to } => {
                if let Some(to) = seek_to {
                    self.push_echo(EchoKind::Seek, to, seq);
                }
                if !local.is_playing {
                    self.push_echo(EchoKind::Play, seek_to.unwrap_or(local.position), seq);
                }
            }
            PlayerCommand::Pause { at } => {
                self.push_echo(EchoKind::Seek, at, seq);
                if local.is_playing {
                    self.push_echo(EchoKind::Pause, at, seq);
                }
            }
            PlayerCommand::Seek { to, play } => {
                self.push_echo(EchoKind::Seek, to, seq);
                match play {
                    Some(true) if !local.is_playing => self.push_echo(EchoKind::Play, to, seq),
                    Some(false) if local.is_playing => self.push_echo(EchoKind::Pause, to, seq),
                    _ => {}
                }
            }
        }
    }

    fn push_echo(&mut self, kind: EchoKind, at: f64, seq: u64) {
        if self.expected.len() == MAX_PENDING_ECHOES {
            self.expected.pop_front();
        }
        self.expected.push_back(ExpectedEcho { kind, at, seq });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SimulatedPlayer;
    use std::time::{Duration, Instant};

    fn local(position: f64, is_playing: bool) -> LocalPlayback {
        LocalPlayback {
            position,
            is_playing,
        }
    }

    #[test]
    fn test_play_within_tolerance_is_ignored() {
        // テスト項目: 既に再生中で位置が許容範囲内なら play 補正は無視される
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);

        // when (操作):
        let decision = engine.on_remote(SyncInstruction::Play { at: 10.0, seq: 1 }, local(11.5, true));

        // then (期待する結果):
        assert_eq!(decision, SyncDecision::Ignore(IgnoreReason::WithinTolerance));
        assert_eq!(engine.pending_echoes(), 0);
    }

    #[test]
    fn test_play_out_of_tolerance_seeks() {
        // テスト項目: 再生中でも位置が許容範囲外なら目標位置へ seek して再生する
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);

        // when (操作):
        let decision = engine.on_remote(SyncInstruction::Play { at: 10.0, seq: 1 }, local(14.0, true));

        // then (期待する結果):
        assert_eq!(
            decision,
            SyncDecision::Apply(PlayerCommand::Play { seek_to: Some(10.0) })
        );
    }

    #[test]
    fn test_play_while_paused_within_tolerance_only_resumes() {
        // テスト項目: 停止中で位置が近ければ seek せずに再生だけ行う
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);

        // when (操作):
        let decision = engine.on_remote(SyncInstruction::Play { at: 10.0, seq: 1 }, local(10.5, false));

        // then (期待する結果):
        assert_eq!(decision, SyncDecision::Apply(PlayerCommand::Play { seek_to: None }));
    }

    #[test]
    fn test_seek_is_applied_regardless_of_tolerance() {
        // テスト項目: seek 指示は許容範囲内でも必ず適用される
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);

        // when (操作):
        let decision = engine.on_remote(
            SyncInstruction::Seek {
                at: 10.0,
                is_playing: None,
                seq: 1,
            },
            local(10.2, true),
        );

        // then (期待する結果):
        assert_eq!(
            decision,
            SyncDecision::Apply(PlayerCommand::Seek { to: 10.0, play: None })
        );
    }

    #[test]
    fn test_stale_instruction_is_dropped() {
        // テスト項目: 適用済みより古い seq の指示は無視される
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);
        engine.on_remote(SyncInstruction::Pause { at: 30.0, seq: 5 }, local(0.0, true));

        // when (操作):
        let decision = engine.on_remote(SyncInstruction::Play { at: 20.0, seq: 4 }, local(30.0, false));

        // then (期待する結果):
        assert_eq!(decision, SyncDecision::Ignore(IgnoreReason::Stale));
        assert_eq!(engine.last_applied_seq(), 5);
    }

    #[test]
    fn test_same_seq_is_not_stale() {
        // テスト項目: 同じ seq の指示（追いつき用の sync_seek）は適用される
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);
        engine.on_remote(SyncInstruction::Pause { at: 30.0, seq: 3 }, local(0.0, true));

        // when (操作):
        let decision = engine.on_remote(
            SyncInstruction::Seek {
                at: 31.0,
                is_playing: Some(true),
                seq: 3,
            },
            local(30.0, false),
        );

        // then (期待する結果):
        assert!(matches!(decision, SyncDecision::Apply(_)));
    }

    #[test]
    fn test_applied_correction_does_not_echo() {
        // テスト項目: 補正で発生したプレイヤーイベントは送り返されない
        // given (前提条件):
        let t0 = Instant::now();
        let mut engine = SyncEngine::new(2.0);
        let mut player = SimulatedPlayer::new(t0);
        let instruction = SyncInstruction::Play { at: 42.0, seq: 1 };

        // when (操作):
        let SyncDecision::Apply(command) = engine.on_remote(instruction, player.local(t0)) else {
            panic!("expected the correction to be applied");
        };
        let events = player.apply(command, t0);

        // then (期待する結果):
        assert_eq!(events.len(), 2);
        for event in events {
            assert_eq!(engine.on_local_event(event), None);
        }
        assert_eq!(engine.pending_echoes(), 0);
    }

    #[test]
    fn test_user_action_after_correction_is_reported() {
        // テスト項目: 補正の後のユーザー操作は sync_action として報告される
        // given (前提条件):
        let t0 = Instant::now();
        let mut engine = SyncEngine::new(2.0);
        let mut player = SimulatedPlayer::new(t0);
        if let SyncDecision::Apply(command) =
            engine.on_remote(SyncInstruction::Play { at: 5.0, seq: 1 }, player.local(t0))
        {
            for event in player.apply(command, t0) {
                engine.on_local_event(event);
            }
        }

        // when (操作):
        let t1 = t0 + Duration::from_secs(4);
        let event = player.pause(t1).unwrap();
        let outbound = engine.on_local_event(event);

        // then (期待する結果):
        assert_eq!(
            outbound,
            Some(OutboundSync {
                action: SyncActionKind::Pause,
                data: SyncActionData {
                    current_time: 9.0,
                    is_playing: None,
                },
            })
        );
    }

    #[test]
    fn test_user_seek_reports_playing_flag() {
        // テスト項目: ユーザーの seek は再生中フラグ付きで報告される
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);

        // when (操作):
        let outbound = engine.on_local_event(PlayerEvent::Seeked {
            at: 70.0,
            is_playing: false,
        });

        // then (期待する結果):
        assert_eq!(
            outbound,
            Some(OutboundSync {
                action: SyncActionKind::Seek,
                data: SyncActionData {
                    current_time: 70.0,
                    is_playing: Some(false),
                },
            })
        );
    }

    #[test]
    fn test_reset_accepts_lower_seq() {
        // テスト項目: reset 後は小さい seq の指示も受け付ける（別の Room に入り直した場合）
        // given (前提条件):
        let mut engine = SyncEngine::new(2.0);
        engine.on_remote(SyncInstruction::Pause { at: 1.0, seq: 9 }, local(0.0, true));

        // when (操作):
        engine.reset();
        let decision = engine.on_remote(SyncInstruction::Play { at: 0.0, seq: 1 }, local(0.0, false));

        // then (期待する結果):
        assert!(matches!(decision, SyncDecision::Apply(_)));
    }
}
