//! Reaction layer of a client session.
//!
//! [`ClientSession`] owns the player, the sync engine and the peer mesh, and turns each
//! server event or typed line into a [`Reaction`]: frames to send, lines to print and
//! whether to quit. It does no I/O, so the whole protocol behaviour is testable
//! without a socket.

use std::time::Instant;

use tandem_server::infrastructure::dto::websocket::{
    AddToPlaylistPayload, ClientEvent, JoinRoomPayload, PlaylistIndexPayload, RoomOnlyPayload,
    RoomStatePayload, ServerEvent, SendMessagePayload, SyncActionPayload, SyncResponsePayload,
    ToggleMutePayload, UserDto,
};

use crate::{
    command::{Command, HELP},
    config::ClientConfig,
    formatter::MessageFormatter,
    media::MediaEngine,
    mesh::{OutboundSignal, PeerMesh},
    player::{PlayerEvent, SimulatedPlayer},
    sync::{SyncDecision, SyncEngine, SyncInstruction},
};

#[derive(Debug, Default, PartialEq)]
pub struct Reaction {
    pub outbound: Vec<ClientEvent>,
    pub display: Vec<String>,
    pub quit: bool,
}

pub struct ClientSession<M: MediaEngine> {
    room_id: String,
    username: String,
    connection_id: Option<String>,
    player: SimulatedPlayer,
    sync: SyncEngine,
    mesh: PeerMesh<M>,
    playlist: Vec<String>,
    current_index: usize,
    users: Vec<UserDto>,
    muted: bool,
    camera: bool,
}

impl<M: MediaEngine> ClientSession<M> {
    pub fn new(config: &ClientConfig, media: M, now: Instant) -> Self {
        Self {
            room_id: config.room_id.clone(),
            username: config.username.clone(),
            connection_id: None,
            player: SimulatedPlayer::new(now),
            sync: SyncEngine::new(config.tolerance_secs),
            mesh: PeerMesh::new(media),
            playlist: Vec::new(),
            current_index: 0,
            users: Vec::new(),
            muted: false,
            camera: false,
        }
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn player(&self) -> &SimulatedPlayer {
        &self.player
    }

    pub fn mesh(&self) -> &PeerMesh<M> {
        &self.mesh
    }

    pub fn playlist(&self) -> &[String] {
        &self.playlist
    }

    pub fn prompt_label(&self) -> String {
        format!("{}@{}", self.username, self.room_id)
    }

    pub fn handle_server_event(&mut self, event: ServerEvent, now: Instant) -> Reaction {
        let mut reaction = Reaction::default();

        match event {
            ServerEvent::Connected(payload) => {
                tracing::info!("Connected as {}", payload.connection_id);
                self.mesh.set_self_id(payload.connection_id.clone());
                self.connection_id = Some(payload.connection_id);
                reaction.outbound.push(ClientEvent::JoinRoom(JoinRoomPayload {
                    room_id: self.room_id.clone(),
                    username: self.username.clone(),
                }));
            }
            ServerEvent::RoomState(state) => self.on_room_state(state, now, &mut reaction),
            ServerEvent::PlaylistUpdated(payload) => {
                self.playlist = payload.playlist;
                self.current_index = payload.current_index;
                if self.playlist.is_empty() {
                    self.player.unload(now);
                } else if self.player.loaded().is_none() {
                    self.player.load(self.current_index, now);
                }
                reaction.display.push(format!(
                    "\n{}",
                    MessageFormatter::format_playlist(&self.playlist, self.current_index)
                ));
            }
            ServerEvent::VideoChanged(payload) => {
                self.current_index = payload.current_index;
                self.player.load(payload.current_index, now);
                self.apply_remote(
                    SyncInstruction::Seek {
                        at: payload.current_time,
                        is_playing: Some(payload.is_playing),
                        seq: payload.seq,
                    },
                    now,
                    &mut reaction,
                );
                reaction.display.push(MessageFormatter::format_video_changed(
                    payload.current_index,
                    self.playlist.get(payload.current_index).map(String::as_str),
                ));
            }
            ServerEvent::SyncPlay(_) | ServerEvent::SyncPause(_) | ServerEvent::SyncSeek(_) => {
                if let Some(instruction) = SyncInstruction::from_server_event(&event)
                    && self.apply_remote(instruction, now, &mut reaction)
                {
                    let (label, at) = match instruction {
                        SyncInstruction::Play { at, .. } => ("Play", at),
                        SyncInstruction::Pause { at, .. } => ("Pause", at),
                        SyncInstruction::Seek { at, .. } => ("Seek", at),
                    };
                    reaction
                        .display
                        .push(MessageFormatter::format_remote_sync(label, at));
                }
            }
            ServerEvent::RequestSync(payload) => {
                reaction
                    .outbound
                    .push(ClientEvent::SyncResponse(SyncResponsePayload {
                        requester_id: payload.requester_id,
                        current_time: self.player.position(now),
                        is_playing: self.player.is_playing(),
                    }));
            }
            ServerEvent::ChatMessage(message) => {
                reaction
                    .display
                    .push(MessageFormatter::format_chat_message(&message));
            }
            ServerEvent::UserJoined(payload) => {
                self.users = payload.users;
                let signals = self.mesh.on_user_joined(&self.users);
                push_signals(&mut reaction, signals);
                reaction.display.push(MessageFormatter::format_user_joined(
                    &payload.username,
                    self.users.len(),
                ));
            }
            ServerEvent::UserLeft(payload) => {
                self.users = payload.users;
                self.mesh.on_user_left(&self.users);
                reaction.display.push(MessageFormatter::format_user_left(
                    &payload.username,
                    self.users.len(),
                ));
            }
            ServerEvent::UserMuted(payload) => {
                let name = self
                    .users
                    .iter()
                    .find(|u| u.id == payload.user_id)
                    .map(|u| u.username.as_str())
                    .unwrap_or(payload.user_id.as_str());
                reaction
                    .display
                    .push(MessageFormatter::format_user_muted(name, payload.is_muted));
            }
            ServerEvent::Offer(signal) => {
                let signals = self.mesh.on_offer(&signal.caller_id, &signal.payload);
                push_signals(&mut reaction, signals);
            }
            ServerEvent::Answer(signal) => self.mesh.on_answer(&signal.caller_id, &signal.payload),
            ServerEvent::IceCandidate(signal) => {
                self.mesh.on_ice_candidate(&signal.caller_id, &signal.payload)
            }
        }

        reaction
    }

    pub fn handle_command(&mut self, line: &str, now: Instant) -> Reaction {
        let mut reaction = Reaction::default();

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                reaction
                    .display
                    .push(MessageFormatter::format_error(&e.to_string()));
                return reaction;
            }
        };

        let room_id = self.room_id.clone();
        match command {
            Command::Chat(message) => {
                if !message.is_empty() {
                    reaction.outbound.push(ClientEvent::SendMessage(SendMessagePayload {
                        room_id,
                        username: self.username.clone(),
                        message,
                    }));
                }
            }
            Command::Add(video_url) => {
                reaction
                    .outbound
                    .push(ClientEvent::AddToPlaylist(AddToPlaylistPayload {
                        room_id,
                        video_url,
                    }));
            }
            Command::Remove(index) => {
                reaction
                    .outbound
                    .push(ClientEvent::RemoveFromPlaylist(PlaylistIndexPayload {
                        room_id,
                        index: wire_index(index),
                    }));
            }
            Command::Video(index) => {
                reaction
                    .outbound
                    .push(ClientEvent::ChangeVideo(PlaylistIndexPayload {
                        room_id,
                        index: wire_index(index),
                    }));
            }
            Command::Play => match self.player.play(now) {
                Some(event) => self.observe(event, &mut reaction),
                None => reaction.display.push("\nAlready playing\n".to_string()),
            },
            Command::Pause => match self.player.pause(now) {
                Some(event) => self.observe(event, &mut reaction),
                None => reaction.display.push("\nAlready paused\n".to_string()),
            },
            Command::Seek(secs) => {
                let event = self.player.seek(secs, now);
                self.observe(event, &mut reaction);
            }
            Command::Sync => {
                reaction
                    .outbound
                    .push(ClientEvent::AskForTime(RoomOnlyPayload { room_id }));
            }
            Command::Mute => {
                self.muted = !self.muted;
                reaction
                    .outbound
                    .push(ClientEvent::ToggleMute(ToggleMutePayload {
                        room_id,
                        is_muted: self.muted,
                    }));
                reaction.display.push(MessageFormatter::format_user_muted(
                    &self.username,
                    self.muted,
                ));
            }
            Command::Camera => {
                self.camera = !self.camera;
                self.mesh.media_mut().set_video(self.camera);
                let signals = self.mesh.renegotiate();
                push_signals(&mut reaction, signals);
                reaction.display.push(format!(
                    "\nCamera {}\n",
                    if self.camera { "on" } else { "off" }
                ));
            }
            Command::Peers => {
                reaction
                    .display
                    .push(MessageFormatter::format_peers(&self.mesh.peers()));
            }
            Command::Status => reaction.display.push(self.status(now)),
            Command::Help => reaction.display.push(format!("\n{}\n", HELP)),
            Command::Quit => reaction.quit = true,
        }

        reaction
    }

    /// Forget per-connection state; the next `connected` starts a fresh join
    pub fn on_disconnect(&mut self) {
        self.connection_id = None;
        self.mesh.clear();
    }

    fn on_room_state(&mut self, state: RoomStatePayload, now: Instant, reaction: &mut Reaction) {
        self.sync.reset();
        self.playlist = state.playlist.clone();
        self.current_index = state.current_index;
        self.users = state.users.clone();

        if self.playlist.is_empty() {
            self.player.unload(now);
        } else {
            self.player.load(self.current_index, now);
        }
        self.apply_remote(
            SyncInstruction::Seek {
                at: state.current_time,
                is_playing: Some(state.is_playing),
                seq: state.seq,
            },
            now,
            reaction,
        );
        self.mesh.on_room_state(&self.users);

        reaction.display.push(MessageFormatter::format_room_state(
            &self.room_id,
            &state,
            self.connection_id.as_deref(),
        ));
    }

    /// Returns whether the player was moved
    fn apply_remote(
        &mut self,
        instruction: SyncInstruction,
        now: Instant,
        reaction: &mut Reaction,
    ) -> bool {
        match self.sync.on_remote(instruction, self.player.local(now)) {
            SyncDecision::Apply(command) => {
                for event in self.player.apply(command, now) {
                    self.observe(event, reaction);
                }
                true
            }
            SyncDecision::Ignore(reason) => {
                tracing::debug!("Ignoring {:?}: {:?}", instruction, reason);
                false
            }
        }
    }

    /// Every player event goes through here, whether the user or a correction caused it
    fn observe(&mut self, event: PlayerEvent, reaction: &mut Reaction) {
        if let Some(sync) = self.sync.on_local_event(event) {
            reaction.outbound.push(ClientEvent::SyncAction(SyncActionPayload {
                room_id: self.room_id.clone(),
                action: sync.action,
                data: sync.data,
            }));
        }
    }

    fn status(&self, now: Instant) -> String {
        let state = if self.player.is_playing() {
            "Playing"
        } else {
            "Paused"
        };
        format!(
            "\n{}{}{} at {} (seq {}){}\n",
            MessageFormatter::format_users(&self.users, self.connection_id.as_deref()),
            MessageFormatter::format_playlist(&self.playlist, self.current_index),
            state,
            MessageFormatter::format_position(self.player.position(now)),
            self.sync.last_applied_seq(),
            if self.muted { ", muted" } else { "" }
        )
    }
}

fn push_signals(reaction: &mut Reaction, signals: Vec<OutboundSignal>) {
    reaction
        .outbound
        .extend(signals.into_iter().map(OutboundSignal::into_client_event));
}

fn wire_index(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}
