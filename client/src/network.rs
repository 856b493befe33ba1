//! Relay connection running on a dedicated networking thread

use log::{error, info, warn};
use shared::{read_message, write_message, ClientMessage, ServerMessage};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Handle to the relay connection.
///
/// The render loop must never block on the socket, so all network work
/// happens on its own thread running a small tokio runtime. Messages cross
/// between the two worlds over channels: sends are fire-and-forget, receipts
/// are drained once per frame with [`Session::poll`].
pub struct Session {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    incoming: std_mpsc::Receiver<ServerMessage>,
    connected: bool,
}

impl Session {
    /// Spawns the networking thread, connects to `addr` and introduces
    /// ourselves with `join`. Connection failures surface later through
    /// [`Session::is_connected`].
    pub fn connect(addr: &str, join: ClientMessage) -> Self {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = std_mpsc::channel();
        let addr = addr.to_string();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start networking runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(run_connection(addr, join, out_rx, in_tx));
        });

        Session {
            outgoing: out_tx,
            incoming: in_rx,
            connected: true,
        }
    }

    /// Queues a message for the relay.
    pub fn send(&mut self, message: ClientMessage) {
        if self.outgoing.send(message).is_err() && self.connected {
            warn!("Dropping message, relay connection is gone");
            self.connected = false;
        }
    }

    /// Drains every message the relay has sent since the last poll.
    pub fn poll(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        loop {
            match self.incoming.try_recv() {
                Ok(message) => messages.push(message),
                Err(std_mpsc::TryRecvError::Empty) => break,
                Err(std_mpsc::TryRecvError::Disconnected) => {
                    if self.connected {
                        warn!("Relay connection lost");
                        self.connected = false;
                    }
                    break;
                }
            }
        }
        messages
    }

    /// False once the background connection has shut down.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

async fn run_connection(
    addr: String,
    join: ClientMessage,
    mut outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    incoming: std_mpsc::Sender<ServerMessage>,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to connect to {}: {}", addr, e);
            return;
        }
    };
    info!("Connected to relay at {}", addr);

    let (mut reader, mut writer) = stream.into_split();

    if let Err(e) = write_message(&mut writer, &join).await {
        error!("Failed to send join message: {}", e);
        return;
    }

    let writer_task = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            if let Err(e) = write_message(&mut writer, &message).await {
                warn!("Failed to send to relay: {}", e);
                break;
            }
        }
    });

    loop {
        match read_message::<_, ServerMessage>(&mut reader).await {
            Ok(Some(message)) => {
                if incoming.send(message).is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("Relay closed the connection");
                break;
            }
            Err(e) => {
                error!("Relay connection error: {}", e);
                break;
            }
        }
    }

    writer_task.abort();
}
