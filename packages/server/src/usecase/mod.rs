//! UseCase 層
//!
//! 1 つの操作につき 1 つの構造体を持ち、Repository で Room を変更してから
//! MessagePusher で「誰に何を届けるか」を決めます。

pub mod add_to_playlist;
pub mod change_video;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod relay_signal;
pub mod remove_from_playlist;
pub mod send_message;
pub mod sync_playback;
pub mod toggle_mute;

#[cfg(test)]
pub(crate) mod testing;

pub use add_to_playlist::AddToPlaylistUseCase;
pub use change_video::ChangeVideoUseCase;
pub use error::{
    ChatError, GetRoomDetailError, MembershipError, PlaybackError, PlaylistError, RelayError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use remove_from_playlist::RemoveFromPlaylistUseCase;
pub use send_message::SendMessageUseCase;
pub use sync_playback::SyncPlaybackUseCase;
pub use toggle_mute::ToggleMuteUseCase;
