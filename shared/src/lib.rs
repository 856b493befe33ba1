pub mod board;
pub mod game;
pub mod piece;
pub mod protocol;

pub use board::{Board, Tile, BOARD_HEIGHT, BOARD_WIDTH, GHOST_COLOR};
pub use game::{drop_interval, Action, GameState};
pub use piece::{Piece, PieceKind};
pub use protocol::{
    read_message, write_message, ClientMessage, Participant, ParticipantId, ServerMessage,
    MAX_FRAME_BYTES,
};
