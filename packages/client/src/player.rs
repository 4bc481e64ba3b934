//! Headless stand-in for a media element.
//!
//! The position advances with wall time while playing. Every state change returns the
//! event a real player would fire, so callers can run those events through the
//! [`SyncEngine`](crate::sync::SyncEngine) exactly like events coming from a browser.
//! Time is passed in explicitly to keep the player deterministic under test.

use std::time::Instant;

/// What the local player is doing right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPlayback {
    pub position: f64,
    pub is_playing: bool,
}

/// Events fired by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Played { at: f64 },
    Paused { at: f64 },
    Seeked { at: f64, is_playing: bool },
}

/// Corrections the sync engine asks the player to perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Play { seek_to: Option<f64> },
    Pause { at: f64 },
    Seek { to: f64, play: Option<bool> },
}

#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    /// Position at `anchor`
    anchor_position: f64,
    anchor: Instant,
    playing: bool,
    loaded: Option<usize>,
}

impl SimulatedPlayer {
    pub fn new(now: Instant) -> Self {
        Self {
            anchor_position: 0.0,
            anchor: now,
            playing: false,
            loaded: None,
        }
    }

    pub fn position(&self, now: Instant) -> f64 {
        if self.playing {
            self.anchor_position + now.saturating_duration_since(self.anchor).as_secs_f64()
        } else {
            self.anchor_position
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded(&self) -> Option<usize> {
        self.loaded
    }

    pub fn local(&self, now: Instant) -> LocalPlayback {
        LocalPlayback {
            position: self.position(now),
            is_playing: self.playing,
        }
    }

    /// Load a playlist item. Loading resets the position and pauses without firing events
    pub fn load(&mut self, index: usize, now: Instant) {
        self.loaded = Some(index);
        self.anchor_position = 0.0;
        self.anchor = now;
        self.playing = false;
    }

    pub fn unload(&mut self, now: Instant) {
        self.loaded = None;
        self.anchor_position = 0.0;
        self.anchor = now;
        self.playing = false;
    }

    /// `None` when already playing
    pub fn play(&mut self, now: Instant) -> Option<PlayerEvent> {
        if self.playing {
            return None;
        }
        self.rebase(now);
        self.playing = true;
        Some(PlayerEvent::Played {
            at: self.anchor_position,
        })
    }

    /// `None` when already paused
    pub fn pause(&mut self, now: Instant) -> Option<PlayerEvent> {
        if !self.playing {
            return None;
        }
        self.rebase(now);
        self.playing = false;
        Some(PlayerEvent::Paused {
            at: self.anchor_position,
        })
    }

    pub fn seek(&mut self, to: f64, now: Instant) -> PlayerEvent {
        self.anchor_position = to.max(0.0);
        self.anchor = now;
        PlayerEvent::Seeked {
            at: self.anchor_position,
            is_playing: self.playing,
        }
    }

    /// Perform a correction and return the events it fires, in order
    pub fn apply(&mut self, command: PlayerCommand, now: Instant) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        match command {
            PlayerCommand::Play { seek_to } => {
                if let Some(to) = seek_to {
                    events.push(self.seek(to, now));
                }
                events.extend(self.play(now));
            }
            PlayerCommand::Pause { at } => {
                events.push(self.seek(at, now));
                events.extend(self.pause(now));
            }
            PlayerCommand::Seek { to, play } => {
                events.push(self.seek(to, now));
                match play {
                    Some(true) => events.extend(self.play(now)),
                    Some(false) => events.extend(self.pause(now)),
                    None => {}
                }
            }
        }
        events
    }

    fn rebase(&mut self, now: Instant) {
        self.anchor_position = self.position(now);
        self.anchor = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_position_advances_only_while_playing() {
        // テスト項目: 再生中だけ位置が進み、一時停止中は止まる
        // given (前提条件):
        let t0 = Instant::now();
        let mut player = SimulatedPlayer::new(t0);

        // when (操作):
        player.play(t0);
        let t1 = t0 + Duration::from_secs(3);
        player.pause(t1);
        let t2 = t1 + Duration::from_secs(10);

        // then (期待する結果):
        assert_eq!(player.position(t2), 3.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_play_when_playing_fires_nothing() {
        // テスト項目: 再生中の play はイベントを発生させない
        // given (前提条件):
        let t0 = Instant::now();
        let mut player = SimulatedPlayer::new(t0);
        player.play(t0);

        // when (操作):
        let event = player.play(t0 + Duration::from_secs(1));

        // then (期待する結果):
        assert_eq!(event, None);
    }

    #[test]
    fn test_apply_pause_seeks_then_pauses() {
        // テスト項目: Pause 補正は位置合わせの seek と pause を順に発生させる
        // given (前提条件):
        let t0 = Instant::now();
        let mut player = SimulatedPlayer::new(t0);
        player.play(t0);

        // when (操作):
        let events = player.apply(PlayerCommand::Pause { at: 40.0 }, t0 + Duration::from_secs(2));

        // then (期待する結果):
        assert_eq!(
            events,
            vec![
                PlayerEvent::Seeked {
                    at: 40.0,
                    is_playing: true
                },
                PlayerEvent::Paused { at: 40.0 },
            ]
        );
        assert_eq!(player.position(t0 + Duration::from_secs(9)), 40.0);
    }

    #[test]
    fn test_load_resets_position() {
        // テスト項目: 動画を読み込むと位置 0 の一時停止状態になる
        // given (前提条件):
        let t0 = Instant::now();
        let mut player = SimulatedPlayer::new(t0);
        player.apply(
            PlayerCommand::Seek {
                to: 50.0,
                play: Some(true),
            },
            t0,
        );

        // when (操作):
        player.load(2, t0 + Duration::from_secs(1));

        // then (期待する結果):
        assert_eq!(player.loaded(), Some(2));
        assert_eq!(player.position(t0 + Duration::from_secs(5)), 0.0);
        assert!(!player.is_playing());
    }
}
