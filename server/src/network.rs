//! Relay network layer: TCP accept loop and per-connection pump tasks

use log::{error, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::protocol::{read_message, write_message};
use shared::{ClientMessage, ParticipantId, ServerMessage};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Events flowing from connection tasks into the relay loop
#[derive(Debug)]
pub enum RelayEvent {
    Connected {
        id: ParticipantId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    Message {
        id: ParticipantId,
        message: ClientMessage,
    },
    Disconnected {
        id: ParticipantId,
    },
}

/// Opaque connection id handed to clients. Random alphanumeric, long
/// enough that collisions are not a practical concern.
pub fn generate_id() -> ParticipantId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Accepts connections forever, spawning a reader and a writer task per
/// socket. Everything the tasks learn funnels into `events`; the relay
/// loop on the other end owns all the actual protocol handling.
pub async fn listen(listener: TcpListener, events: mpsc::UnboundedSender<RelayEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let id = generate_id();
                info!("Connection {} accepted from {}", id, addr);
                spawn_connection(stream, id, events.clone());
            }
            Err(err) => {
                error!("Failed to accept connection: {}", err);
            }
        }
    }
}

fn spawn_connection(
    stream: TcpStream,
    id: ParticipantId,
    events: mpsc::UnboundedSender<RelayEvent>,
) {
    let (read_half, write_half) = stream.into_split();
    let (sender, receiver) = mpsc::unbounded_channel();

    if events
        .send(RelayEvent::Connected {
            id: id.clone(),
            sender,
        })
        .is_err()
    {
        // Relay loop is gone; nothing to pump for.
        return;
    }

    tokio::spawn(write_loop(id.clone(), write_half, receiver));
    tokio::spawn(read_loop(id, read_half, events));
}

/// Drains the connection's outbound queue onto the socket. Ends when the
/// relay drops the queue or the socket rejects a write.
async fn write_loop(
    id: ParticipantId,
    mut write_half: OwnedWriteHalf,
    mut receiver: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = receiver.recv().await {
        if let Err(err) = write_message(&mut write_half, &message).await {
            warn!("Write to {} failed: {}", id, err);
            break;
        }
    }
}

/// Decodes inbound frames into relay events. Exactly one Disconnected
/// event is emitted when the stream ends, however it ends.
async fn read_loop(
    id: ParticipantId,
    mut read_half: OwnedReadHalf,
    events: mpsc::UnboundedSender<RelayEvent>,
) {
    loop {
        match read_message::<_, ClientMessage>(&mut read_half).await {
            Ok(Some(message)) => {
                if events
                    .send(RelayEvent::Message {
                        id: id.clone(),
                        message,
                    })
                    .is_err()
                {
                    return;
                }
            }
            Ok(None) => {
                info!("Connection {} closed", id);
                break;
            }
            Err(err) => {
                warn!("Connection {} read error: {}", id, err);
                break;
            }
        }
    }
    let _ = events.send(RelayEvent::Disconnected { id });
}
