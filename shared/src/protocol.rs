//! Wire contract between clients and the relay.
//!
//! Every frame is a u32 big endian length followed by a bincode body. Both
//! directions use the same framing; which payload enum applies depends on
//! the direction.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::{Action, GameState};

/// Relay-assigned connection identity. Plain lexicographic string order,
/// which the call layer relies on to pick exactly one initiator per pair.
pub type ParticipantId = String;

/// Frames longer than this are treated as a protocol violation.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// One player as the relay knows them: identity plus their latest
/// self-reported simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    pub avatar: String,
    pub game: GameState,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    // Lobby
    Join {
        username: Option<String>,
        avatar: Option<String>,
    },
    StateUpdate {
        state: GameState,
    },
    GameAction {
        action: Action,
    },

    // Call signaling
    CallJoin,
    CallLeave,
    RtcSignal {
        target: ParticipantId,
        payload: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    // Lobby
    Connected {
        id: ParticipantId,
    },
    Roster {
        participants: HashMap<ParticipantId, Participant>,
    },
    StateUpdate {
        id: ParticipantId,
        state: GameState,
    },
    RemoteAction {
        id: ParticipantId,
        action: Action,
    },

    // Call signaling
    CallJoined {
        id: ParticipantId,
    },
    CallIncoming {
        id: ParticipantId,
    },
    CallLeft {
        id: ParticipantId,
    },
    RtcSignal {
        from: ParticipantId,
        payload: String,
    },
}

/// Writes one length-prefixed frame and flushes it.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = bincode::serialize(message)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds size limit",
        ));
    }
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame. `Ok(None)` means the peer closed the
/// stream cleanly between frames.
pub async fn read_message<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: serde::de::DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds size limit",
        ));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    bincode::deserialize(&body)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
