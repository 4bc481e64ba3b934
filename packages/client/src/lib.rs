//! Headless watch-party participant.
//!
//! Keeps a simulated player in step with the room, relays call signaling for a full
//! peer mesh and exchanges chat, all driven from a line-oriented terminal UI.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod formatter;
pub mod media;
pub mod mesh;
pub mod player;
pub mod runner;
pub mod session;
pub mod sync;

pub use config::ClientConfig;
pub use controller::{ClientSession, Reaction};
pub use error::ClientError;
pub use runner::{ReconnectPolicy, run_client};
