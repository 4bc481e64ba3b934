//! Data Transfer Objects (DTOs) for the watch-party server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event DTOs (the wire contract shared with clients)
//! - `http`: HTTP API response DTOs
//! - `conversion`: DTO ⇔ domain conversions (inbound validation happens here)

pub mod conversion;
pub mod http;
pub mod websocket;
