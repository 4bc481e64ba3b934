//! Media transport seam.
//!
//! A [`MediaEngine`] owns the actual peer connections (camera, microphone, ICE agent).
//! The mesh only drives it with session descriptions and candidates, so a browser
//! binding, a native WebRTC stack or the headless [`SignalOnlyMedia`] can sit behind it.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::error::MediaError;

#[cfg_attr(test, mockall::automock)]
pub trait MediaEngine: Send {
    /// Start (or restart) negotiation with `peer` and return the local offer
    fn create_offer(&mut self, peer: &str) -> Result<Value, MediaError>;

    /// Apply a remote offer and return the local answer
    fn accept_offer(&mut self, peer: &str, offer: &Value) -> Result<Value, MediaError>;

    fn accept_answer(&mut self, peer: &str, answer: &Value) -> Result<(), MediaError>;

    fn add_ice_candidate(&mut self, peer: &str, candidate: &Value) -> Result<(), MediaError>;

    /// Candidates gathered for `peer` since the last call
    fn local_candidates(&mut self, peer: &str) -> Vec<Value>;

    fn close(&mut self, peer: &str);

    /// Enable or disable the outgoing video track
    fn set_video(&mut self, enabled: bool);
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PeerSession {
    remote_description: bool,
    remote_candidates: usize,
    candidates_sent: bool,
}

/// Headless engine: produces SDP-shaped descriptors and validates what it receives,
/// but carries no media.
#[derive(Debug, Default)]
pub struct SignalOnlyMedia {
    sessions: HashMap<String, PeerSession>,
    video: bool,
    version: u64,
}

impl SignalOnlyMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_enabled(&self) -> bool {
        self.video
    }

    pub fn has_session(&self, peer: &str) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn remote_candidates(&self, peer: &str) -> usize {
        self.sessions
            .get(peer)
            .map(|s| s.remote_candidates)
            .unwrap_or(0)
    }

    fn description(&mut self, kind: &str) -> Value {
        self.version += 1;
        let mut sdp = format!(
            "v=0\r\no=- 0 {} IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n",
            self.version
        );
        if self.video {
            sdp.push_str("m=video 9 UDP/TLS/RTP/SAVPF 96\r\n");
        }
        json!({ "type": kind, "sdp": sdp })
    }
}

fn check_description(value: &Value, expected: &str) -> Result<(), MediaError> {
    let kind = value.get("type").and_then(Value::as_str);
    let sdp = value.get("sdp").and_then(Value::as_str);
    match (kind, sdp) {
        (Some(kind), Some(sdp)) if kind == expected && sdp.starts_with("v=0") => Ok(()),
        _ => Err(MediaError::MalformedDescription(format!(
            "expected an {} with an SDP body, got {}",
            expected, value
        ))),
    }
}

impl MediaEngine for SignalOnlyMedia {
    fn create_offer(&mut self, peer: &str) -> Result<Value, MediaError> {
        self.sessions.entry(peer.to_string()).or_default();
        Ok(self.description("offer"))
    }

    fn accept_offer(&mut self, peer: &str, offer: &Value) -> Result<Value, MediaError> {
        check_description(offer, "offer")?;
        self.sessions
            .entry(peer.to_string())
            .or_default()
            .remote_description = true;
        Ok(self.description("answer"))
    }

    fn accept_answer(&mut self, peer: &str, answer: &Value) -> Result<(), MediaError> {
        check_description(answer, "answer")?;
        let session = self
            .sessions
            .get_mut(peer)
            .ok_or_else(|| MediaError::NoSession(peer.to_string()))?;
        session.remote_description = true;
        Ok(())
    }

    fn add_ice_candidate(&mut self, peer: &str, candidate: &Value) -> Result<(), MediaError> {
        if candidate.get("candidate").and_then(Value::as_str).is_none() {
            return Err(MediaError::MalformedCandidate(candidate.to_string()));
        }
        let session = self
            .sessions
            .get_mut(peer)
            .ok_or_else(|| MediaError::NoSession(peer.to_string()))?;
        session.remote_candidates += 1;
        Ok(())
    }

    fn local_candidates(&mut self, peer: &str) -> Vec<Value> {
        match self.sessions.get_mut(peer) {
            Some(session) if !session.candidates_sent => {
                session.candidates_sent = true;
                vec![json!({
                    "candidate": "candidate:1 1 udp 2122260223 127.0.0.1 9 typ host",
                    "sdpMid": "0",
                    "sdpMLineIndex": 0,
                })]
            }
            _ => Vec::new(),
        }
    }

    fn close(&mut self, peer: &str) {
        self.sessions.remove(peer);
    }

    fn set_video(&mut self, enabled: bool) {
        self.video = enabled;
    }
}
