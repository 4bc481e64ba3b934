//! Peer-to-peer call mesh.
//!
//! Every client keeps one [`PeerLink`] per other room member. Link lifetime follows the
//! roster: a member already in the room initiates toward each newcomer it learns about
//! from `user_joined`, the newcomer only answers, and a link is torn down as soon as its
//! peer disappears from a roster update.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tandem_server::{
    domain::SignalKind,
    infrastructure::dto::websocket::{ClientEvent, OutgoingSignal, UserDto},
};

use crate::{error::MediaError, media::MediaEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Offer sent, waiting for the answer
    OfferSent,
    /// Answer sent, waiting for the first remote candidate
    AnswerSent,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerLink {
    pub role: PeerRole,
    pub phase: LinkPhase,
}

/// Signaling message to relay through the server
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundSignal {
    pub kind: SignalKind,
    pub target: String,
    pub payload: Value,
}

impl OutboundSignal {
    pub fn into_client_event(self) -> ClientEvent {
        let signal = OutgoingSignal {
            payload: self.payload,
            target: self.target,
            caller_id: None,
        };
        match self.kind {
            SignalKind::Offer => ClientEvent::Offer(signal),
            SignalKind::Answer => ClientEvent::Answer(signal),
            SignalKind::IceCandidate => ClientEvent::IceCandidate(signal),
        }
    }
}

pub struct PeerMesh<M: MediaEngine> {
    media: M,
    self_id: Option<String>,
    /// Last roster seen, used to tell newcomers apart
    roster: HashSet<String>,
    links: HashMap<String, PeerLink>,
}

impl<M: MediaEngine> PeerMesh<M> {
    pub fn new(media: M) -> Self {
        Self {
            media,
            self_id: None,
            roster: HashSet::new(),
            links: HashMap::new(),
        }
    }

    pub fn set_self_id(&mut self, id: impl Into<String>) {
        self.self_id = Some(id.into());
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn link(&self, peer: &str) -> Option<PeerLink> {
        self.links.get(peer).copied()
    }

    /// Links sorted by peer id
    pub fn peers(&self) -> Vec<(String, PeerLink)> {
        let mut peers: Vec<_> = self
            .links
            .iter()
            .map(|(id, link)| (id.clone(), *link))
            .collect();
        peers.sort_by(|a, b| a.0.cmp(&b.0));
        peers
    }

    /// The joiner's view of the room: remember the roster, never initiate
    pub fn on_room_state(&mut self, users: &[UserDto]) {
        self.prune(users);
        self.roster = users.iter().map(|u| u.id.clone()).collect();
    }

    /// Initiate toward every member not seen before
    pub fn on_user_joined(&mut self, users: &[UserDto]) -> Vec<OutboundSignal> {
        self.prune(users);

        let newcomers: Vec<String> = users
            .iter()
            .map(|u| u.id.clone())
            .filter(|id| {
                !self.roster.contains(id)
                    && !self.links.contains_key(id)
                    && self.self_id.as_deref() != Some(id.as_str())
            })
            .collect();
        self.roster = users.iter().map(|u| u.id.clone()).collect();

        let mut outbound = Vec::new();
        for peer in newcomers {
            match self.initiate(&peer) {
                Ok(signals) => {
                    self.links.insert(
                        peer,
                        PeerLink {
                            role: PeerRole::Initiator,
                            phase: LinkPhase::OfferSent,
                        },
                    );
                    outbound.extend(signals);
                }
                Err(e) => self.fail(&peer, e),
            }
        }
        outbound
    }

    pub fn on_user_left(&mut self, users: &[UserDto]) {
        self.prune(users);
        self.roster = users.iter().map(|u| u.id.clone()).collect();
    }

    pub fn on_offer(&mut self, caller_id: &str, payload: &Value) -> Vec<OutboundSignal> {
        let answer = match self.media.accept_offer(caller_id, payload) {
            Ok(answer) => answer,
            Err(e) => {
                self.fail(caller_id, e);
                return Vec::new();
            }
        };

        // a renegotiation offer on an established link keeps it connected
        let link = self.links.entry(caller_id.to_string()).or_insert(PeerLink {
            role: PeerRole::Responder,
            phase: LinkPhase::AnswerSent,
        });
        tracing::debug!("Answering offer from {} ({:?})", caller_id, link.role);

        let mut outbound = vec![OutboundSignal {
            kind: SignalKind::Answer,
            target: caller_id.to_string(),
            payload: answer,
        }];
        outbound.extend(self.candidates_for(caller_id));
        outbound
    }

    pub fn on_answer(&mut self, caller_id: &str, payload: &Value) {
        if !self.links.contains_key(caller_id) {
            tracing::debug!("Ignoring answer from unknown peer {}", caller_id);
            return;
        }
        match self.media.accept_answer(caller_id, payload) {
            Ok(()) => {
                if let Some(link) = self.links.get_mut(caller_id) {
                    link.phase = LinkPhase::Connected;
                }
                tracing::info!("Peer link with {} established", caller_id);
            }
            Err(e) => self.fail(caller_id, e),
        }
    }

    pub fn on_ice_candidate(&mut self, caller_id: &str, payload: &Value) {
        if !self.links.contains_key(caller_id) {
            tracing::debug!("Ignoring ICE candidate from unknown peer {}", caller_id);
            return;
        }
        match self.media.add_ice_candidate(caller_id, payload) {
            Ok(()) => {
                if let Some(link) = self.links.get_mut(caller_id)
                    && link.phase == LinkPhase::AnswerSent
                {
                    link.phase = LinkPhase::Connected;
                    tracing::info!("Peer link with {} established", caller_id);
                }
            }
            Err(e) => self.fail(caller_id, e),
        }
    }

    /// Re-offer to every link after the local tracks changed
    pub fn renegotiate(&mut self) -> Vec<OutboundSignal> {
        let peers: Vec<String> = self.links.keys().cloned().collect();
        let mut outbound = Vec::new();
        for peer in peers {
            match self.media.create_offer(&peer) {
                Ok(offer) => {
                    if let Some(link) = self.links.get_mut(&peer) {
                        link.phase = LinkPhase::OfferSent;
                    }
                    outbound.push(OutboundSignal {
                        kind: SignalKind::Offer,
                        target: peer,
                        payload: offer,
                    });
                }
                Err(e) => self.fail(&peer, e),
            }
        }
        outbound
    }

    /// Drop every link, e.g. when the connection to the server is lost
    pub fn clear(&mut self) {
        for peer in self.links.keys() {
            self.media.close(peer);
        }
        self.links.clear();
        self.roster.clear();
    }

    fn initiate(&mut self, peer: &str) -> Result<Vec<OutboundSignal>, MediaError> {
        let offer = self.media.create_offer(peer)?;
        let mut outbound = vec![OutboundSignal {
            kind: SignalKind::Offer,
            target: peer.to_string(),
            payload: offer,
        }];
        outbound.extend(self.candidates_for(peer));
        Ok(outbound)
    }

    fn candidates_for(&mut self, peer: &str) -> Vec<OutboundSignal> {
        self.media
            .local_candidates(peer)
            .into_iter()
            .map(|candidate| OutboundSignal {
                kind: SignalKind::IceCandidate,
                target: peer.to_string(),
                payload: candidate,
            })
            .collect()
    }

    fn prune(&mut self, users: &[UserDto]) {
        let present: HashSet<&str> = users.iter().map(|u| u.id.as_str()).collect();
        let gone: Vec<String> = self
            .links
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        for peer in gone {
            self.links.remove(&peer);
            self.media.close(&peer);
            tracing::info!("Peer link with {} closed", peer);
        }
    }

    fn fail(&mut self, peer: &str, error: MediaError) {
        tracing::warn!("Signaling with {} failed: {}", peer, error);
        self.links.remove(peer);
        self.media.close(peer);
    }
}
