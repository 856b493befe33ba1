//! The relay loop: state replication and call signaling
//!
//! One task owns the roster and every connection's outbound queue, and
//! processes events strictly in arrival order. Join and leave produce a
//! full roster snapshot for everyone; state reports fan out as deltas to
//! everyone but the reporter; call signals are forwarded point to point.
//! Because a single loop applies each event to completion before the next,
//! every client observes the same broadcast order and no state needs a
//! lock.

use std::collections::HashMap;

use log::{debug, info};
use shared::{ClientMessage, ParticipantId, ServerMessage};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::network::{self, RelayEvent};
use crate::roster::Roster;

/// Replication and signaling hub. Owns all mutable server state.
#[derive(Default)]
pub struct Relay {
    roster: Roster,
    connections: HashMap<ParticipantId, mpsc::UnboundedSender<ServerMessage>>,
}

impl Relay {
    pub fn new() -> Self {
        Self {
            roster: Roster::new(),
            connections: HashMap::new(),
        }
    }

    /// Processes relay events until the channel closes.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<RelayEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("Relay loop finished");
    }

    /// Applies one event to completion. All protocol behavior lives here.
    pub fn handle_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected { id, sender } => {
                if sender
                    .send(ServerMessage::Connected { id: id.clone() })
                    .is_err()
                {
                    debug!("Connection {} went away before the greeting", id);
                    return;
                }
                self.connections.insert(id, sender);
            }

            RelayEvent::Message { id, message } => self.handle_message(id, message),

            RelayEvent::Disconnected { id } => {
                self.connections.remove(&id);
                if self.roster.leave(&id).is_some() {
                    // Order matters for observers: the call teardown notice
                    // goes out before the shrunken roster.
                    self.broadcast(ServerMessage::CallLeft { id: id.clone() }, Some(&id));
                    self.broadcast_roster();
                }
            }
        }
    }

    fn handle_message(&mut self, id: ParticipantId, message: ClientMessage) {
        match message {
            ClientMessage::Join { username, avatar } => {
                self.roster.join(&id, username, avatar);
                self.broadcast_roster();
            }

            ClientMessage::StateUpdate { state } => {
                if self.roster.update_state(&id, state.clone()) {
                    self.broadcast(
                        ServerMessage::StateUpdate {
                            id: id.clone(),
                            state,
                        },
                        Some(&id),
                    );
                } else {
                    debug!("State report from {} before join, ignored", id);
                }
            }

            ClientMessage::GameAction { action } => {
                if self.roster.contains(&id) {
                    self.broadcast(
                        ServerMessage::RemoteAction {
                            id: id.clone(),
                            action,
                        },
                        Some(&id),
                    );
                }
            }

            ClientMessage::CallJoin => {
                info!("Participant {} joined the call", id);
                // Existing callers learn about the newcomer, and the
                // newcomer's side of each pairing is prompted separately.
                self.broadcast(ServerMessage::CallJoined { id: id.clone() }, Some(&id));
                self.broadcast(ServerMessage::CallIncoming { id: id.clone() }, Some(&id));
            }

            ClientMessage::CallLeave => {
                info!("Participant {} left the call", id);
                self.broadcast(ServerMessage::CallLeft { id: id.clone() }, Some(&id));
            }

            ClientMessage::RtcSignal { target, payload } => match self.connections.get(&target) {
                Some(sender) => {
                    let _ = sender.send(ServerMessage::RtcSignal { from: id, payload });
                }
                None => {
                    debug!("Dropping signal from {} to unknown target {}", id, target);
                }
            },
        }
    }

    /// Sends to every open connection except `exclude`. Connections whose
    /// queue is gone are forgotten; their roster cleanup happens when the
    /// reader task reports the disconnect.
    fn broadcast(&mut self, message: ServerMessage, exclude: Option<&ParticipantId>) {
        self.connections.retain(|id, sender| {
            if Some(id) == exclude {
                return true;
            }
            if sender.send(message.clone()).is_err() {
                debug!("Dropping dead connection {}", id);
                return false;
            }
            true
        });
    }

    /// Full-table snapshot to everyone, joined or not.
    fn broadcast_roster(&mut self) {
        let message = ServerMessage::Roster {
            participants: self.roster.snapshot(),
        };
        self.broadcast(message, None);
    }
}

/// Binds to `addr` and serves the relay until the process exits.
pub async fn serve(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Relay listening on {}", listener.local_addr()?);
    serve_on(listener).await;
    Ok(())
}

/// Serves the relay on an already-bound listener. Split out so tests can
/// bind to an ephemeral port first.
pub async fn serve_on(listener: TcpListener) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(network::listen(listener, events_tx));
    Relay::new().run(events_rx).await;
}
