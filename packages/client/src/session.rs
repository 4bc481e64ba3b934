//! WebSocket client session management.

use std::{io::Write, time::Instant};

use futures_util::{Sink, SinkExt, StreamExt};
use tandem_server::infrastructure::dto::websocket::ServerEvent;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    config::ClientConfig,
    controller::{ClientSession, Reaction},
    error::ClientError,
    media::MediaEngine,
};

/// Run one connection until the user quits (`Ok`) or the connection is lost (`Err`).
///
/// `session` outlives the connection so playlist, player and mute state survive a
/// reconnect; the server hands out a new connection id and the client joins again.
pub async fn run_client_session<M: MediaEngine>(
    config: &ClientConfig,
    session: &mut ClientSession<M>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(config.url.as_str())
        .await
        .map_err(|e| match e {
            tungstenite::Error::Http(response) => {
                ClientError::Rejected(format!("HTTP {}", response.status()))
            }
            other => ClientError::ConnectionError(other.to_string()),
        })?;

    tracing::info!("Connected to {}", config.url);
    println!(
        "\nJoining room '{}' as '{}'. Type /help for commands.\n",
        config.room_id, config.username
    );

    let (mut write, mut read) = ws_stream.split();
    let label = session.prompt_label();

    let result = loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let event = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Ignoring unreadable frame: {}", e);
                            continue;
                        }
                    };
                    let reaction = session.handle_server_event(event, Instant::now());
                    if let Err(e) = deliver(&mut write, &reaction, &label).await {
                        break Err(e);
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    break Err(ClientError::ConnectionError("Connection closed".to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break Err(ClientError::ConnectionError(e.to_string()));
                }
            },
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // input thread ended (Ctrl+C / Ctrl+D)
                    break Ok(());
                };
                let reaction = session.handle_command(&line, Instant::now());
                if let Err(e) = deliver(&mut write, &reaction, &label).await {
                    break Err(e);
                }
                if reaction.quit {
                    write.send(Message::Close(None)).await.ok();
                    break Ok(());
                }
            }
        }
    };

    session.on_disconnect();
    result
}

/// Send the reaction's frames, then print its lines
async fn deliver<S>(write: &mut S, reaction: &Reaction, label: &str) -> Result<(), ClientError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    for event in &reaction.outbound {
        let json =
            serde_json::to_string(event).map_err(|e| ClientError::Encode(e.to_string()))?;
        write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    }

    if !reaction.display.is_empty() {
        for line in &reaction.display {
            print!("{}", line);
        }
        // output lands on the readline line; put the prompt back
        print!("{}> ", label);
        std::io::stdout().flush().ok();
    }
    Ok(())
}
