//! Parsing of typed input lines.

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Anything not starting with `/`
    Chat(String),
    Add(String),
    Remove(usize),
    Video(usize),
    Play,
    Pause,
    Seek(f64),
    Sync,
    Mute,
    Camera,
    Peers,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
/add <url>      append a video to the playlist
/remove <i>     remove playlist item i
/video <i>      switch to playlist item i
/play, /pause   control playback for everyone
/seek <secs>    jump to a position
/sync           ask another member for the live position
/mute           toggle your microphone
/camera         toggle your camera
/peers          show call links
/status         show the room and player state
/quit           leave
anything else is sent as chat";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Chat(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "add" if !arg.is_empty() => Ok(Command::Add(arg.to_string())),
            "add" => Err(CommandError::Usage("/add <url>")),
            "remove" => parse_index(arg)
                .map(Command::Remove)
                .ok_or(CommandError::Usage("/remove <index>")),
            "video" => parse_index(arg)
                .map(Command::Video)
                .ok_or(CommandError::Usage("/video <index>")),
            "play" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "seek" => arg
                .parse::<f64>()
                .ok()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Command::Seek)
                .ok_or(CommandError::Usage("/seek <seconds>")),
            "sync" => Ok(Command::Sync),
            "mute" => Ok(Command::Mute),
            "camera" => Ok(Command::Camera),
            "peers" => Ok(Command::Peers),
            "status" => Ok(Command::Status),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_index(arg: &str) -> Option<usize> {
    arg.parse().ok()
}
