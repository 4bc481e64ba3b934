//! インメモリ実装

mod room;

pub use room::{InMemoryRoomRepository, RoomPolicy};
