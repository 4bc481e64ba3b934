//! Client execution logic with reconnection support.

use std::time::{Duration, Instant};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig, controller::ClientSession, error::ClientError, media::SignalOnlyMedia,
    session::run_client_session,
};

/// A session that stayed up this long counts as recovered and resets the backoff
const STABLE_SESSION: Duration = Duration::from_secs(30);

/// Consecutive-failure backoff between connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the next attempt after `failures` consecutive failures, or `None` to give up.
    ///
    /// A rejected handshake (unknown path, bad room id) is never retried.
    pub fn next_delay(&self, error: &ClientError, failures: u32) -> Option<Duration> {
        if matches!(error, ClientError::Rejected(_)) || failures == 0 {
            return None;
        }
        if failures > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        Some(
            self.base_delay
                .checked_mul(factor)
                .map_or(self.max_delay, |delay| delay.min(self.max_delay)),
        )
    }
}

/// Run the client with reconnection logic
pub async fn run_client(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let policy = ReconnectPolicy::default();
    let mut session = ClientSession::new(&config, SignalOnlyMedia::new(), Instant::now());
    let mut input_rx = spawn_input_thread(format!("{}> ", session.prompt_label()));
    let mut failures = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            config.url,
            config.username,
            failures + 1,
            policy.max_attempts + 1
        );

        let started = Instant::now();
        match run_client_session(&config, &mut session, &mut input_rx).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                if started.elapsed() >= STABLE_SESSION {
                    failures = 0;
                }
                failures += 1;

                let Some(delay) = policy.next_delay(&e, failures) else {
                    if matches!(e, ClientError::Rejected(_)) {
                        tracing::error!("{}", e);
                    } else {
                        tracing::error!(
                            "Failed to reconnect after {} attempts. Exiting.",
                            policy.max_attempts
                        );
                    }
                    return Err(Box::new(e));
                };

                tracing::warn!("Connection lost: {}", e);
                tracing::info!(
                    "Reconnecting in {:.1} seconds... (attempt {}/{})",
                    delay.as_secs_f64(),
                    failures + 1,
                    policy.max_attempts + 1
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Read lines on a blocking thread (rustyline is synchronous); the channel closes on Ctrl+C / Ctrl+D
fn spawn_input_thread(prompt: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
