//! Server state shared by all handlers.

use std::sync::Arc;

use tandem_shared::time::Clock;

use crate::{
    domain::{MessagePusher, RoomRepository},
    usecase::{
        AddToPlaylistUseCase, ChangeVideoUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, RelaySignalUseCase, RemoveFromPlaylistUseCase,
        SendMessageUseCase, SyncPlaybackUseCase, ToggleMuteUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（接続の登録と `connected` の送信に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub join_room_usecase: JoinRoomUseCase,
    pub leave_room_usecase: LeaveRoomUseCase,
    pub add_to_playlist_usecase: AddToPlaylistUseCase,
    pub remove_from_playlist_usecase: RemoveFromPlaylistUseCase,
    pub change_video_usecase: ChangeVideoUseCase,
    pub sync_playback_usecase: SyncPlaybackUseCase,
    pub send_message_usecase: SendMessageUseCase,
    pub toggle_mute_usecase: ToggleMuteUseCase,
    pub relay_signal_usecase: RelaySignalUseCase,
    pub get_rooms_usecase: GetRoomsUseCase,
    pub get_room_detail_usecase: GetRoomDetailUseCase,
}

impl AppState {
    /// Repository・MessagePusher・Clock から全ての UseCase を組み立てる
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room_usecase: JoinRoomUseCase::new(repository.clone(), message_pusher.clone()),
            leave_room_usecase: LeaveRoomUseCase::new(repository.clone(), message_pusher.clone()),
            add_to_playlist_usecase: AddToPlaylistUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            remove_from_playlist_usecase: RemoveFromPlaylistUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            change_video_usecase: ChangeVideoUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            sync_playback_usecase: SyncPlaybackUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            send_message_usecase: SendMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock,
            ),
            toggle_mute_usecase: ToggleMuteUseCase::new(repository.clone(), message_pusher.clone()),
            relay_signal_usecase: RelaySignalUseCase::new(message_pusher.clone()),
            get_rooms_usecase: GetRoomsUseCase::new(repository.clone()),
            get_room_detail_usecase: GetRoomDetailUseCase::new(repository),
            message_pusher,
        }
    }
}
