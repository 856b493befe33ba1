use rand::Rng;
use serde::{Deserialize, Serialize};

/// Spawn anchor for freshly dealt pieces, near the top middle of the board.
pub const SPAWN_X: i32 = 3;
pub const SPAWN_Y: i32 = 0;

// Occupied cells as (x, y) offsets from the piece anchor, one row of four
// per rotation step. The I piece rotates inside a 4x4 box, O inside 2x2,
// the rest inside 3x3, which is why the offsets are not centered the same
// way for every kind.
const I_CELLS: [[(i32, i32); 4]; 4] = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
    [(1, 0), (1, 1), (1, 2), (1, 3)],
];

const O_CELLS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (1, 0), (0, 1), (1, 1)],
    [(0, 0), (1, 0), (0, 1), (1, 1)],
    [(0, 0), (1, 0), (0, 1), (1, 1)],
    [(0, 0), (1, 0), (0, 1), (1, 1)],
];

const T_CELLS: [[(i32, i32); 4]; 4] = [
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
];

const S_CELLS: [[(i32, i32); 4]; 4] = [
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(1, 0), (1, 1), (2, 1), (2, 2)],
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_CELLS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(2, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
];

const J_CELLS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
];

const L_CELLS: [[(i32, i32); 4]; 4] = [
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 1), (0, 2)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Uniform draw over the seven kinds. Each deal is independent.
    pub fn random() -> Self {
        let idx = rand::thread_rng().gen_range(0..Self::ALL.len());
        Self::ALL[idx]
    }

    /// RGB fill color used by renderers.
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            PieceKind::I => (0, 240, 240),
            PieceKind::O => (240, 240, 0),
            PieceKind::T => (160, 0, 240),
            PieceKind::S => (0, 240, 0),
            PieceKind::Z => (240, 0, 0),
            PieceKind::J => (0, 0, 240),
            PieceKind::L => (240, 160, 0),
        }
    }

    pub fn offsets(&self, rotation: u8) -> [(i32, i32); 4] {
        let r = (rotation % 4) as usize;
        match self {
            PieceKind::I => I_CELLS[r],
            PieceKind::O => O_CELLS[r],
            PieceKind::T => T_CELLS[r],
            PieceKind::S => S_CELLS[r],
            PieceKind::Z => Z_CELLS[r],
            PieceKind::J => J_CELLS[r],
            PieceKind::L => L_CELLS[r],
        }
    }
}

/// A falling piece. Plain value type: movement and rotation hand back a new
/// piece, so candidate positions can be tested without touching the current
/// one. The anchor may sit outside the board while the occupied cells are
/// still inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: u8,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: 0,
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    /// Absolute board coordinates of the four occupied cells.
    pub fn cells(&self) -> [(i32, i32); 4] {
        let mut cells = self.kind.offsets(self.rotation);
        for (cx, cy) in cells.iter_mut() {
            *cx += self.x;
            *cy += self.y;
        }
        cells
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            rotation: (self.rotation + 1) % 4,
            ..*self
        }
    }
}
