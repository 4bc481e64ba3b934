//! Client configuration.

/// Default tolerance (seconds) within which a play/pause correction is ignored
pub const DEFAULT_TOLERANCE_SECS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3001/ws`
    pub url: String,
    pub room_id: String,
    pub username: String,
    pub tolerance_secs: f64,
}

impl ClientConfig {
    pub fn new(url: String, room_id: String, username: String) -> Self {
        Self {
            url,
            room_id,
            username,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: f64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }
}
