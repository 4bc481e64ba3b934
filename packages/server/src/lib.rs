//! Watch-party room server library.
//!
//! Keeps a shared playlist and playback state per room, fans out sync instructions
//! and chat to room members, and relays call-signaling messages between connections.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
