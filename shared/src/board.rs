use serde::{Deserialize, Serialize};

use crate::piece::{Piece, PieceKind};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Fill color for ghost cells. Deliberately outside the piece palette.
pub const GHOST_COLOR: (u8, u8, u8) = (51, 51, 51);

/// One display cell of the composite produced by [`Board::with_overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Filled(PieceKind),
    Ghost,
}

/// The settled playfield. Rows are indexed top to bottom; a cell remembers
/// which piece kind filled it so renderers can keep the original colors.
/// All mutating operations return a new board, so a caller can probe
/// candidate placements against the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<PieceKind>; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<PieceKind> {
        self.cells[y][x]
    }

    pub fn row_is_full(&self, y: usize) -> bool {
        self.cells[y].iter().all(|cell| cell.is_some())
    }

    /// A placement is legal when every occupied cell stays inside the side
    /// and bottom walls and does not overlap a settled cell. Rows above the
    /// top edge are legal, so pieces may spawn partially off screen.
    pub fn is_valid_position(&self, piece: &Piece, dx: i32, dy: i32) -> bool {
        for (x, y) in piece.offset(dx, dy).cells() {
            if x < 0 || x >= BOARD_WIDTH as i32 || y >= BOARD_HEIGHT as i32 {
                return false;
            }
            if y >= 0 && self.cells[y as usize][x as usize].is_some() {
                return false;
            }
        }
        true
    }

    /// New board with the piece stamped in. Cells above the top edge are
    /// discarded instead of wrapping.
    pub fn with_piece(&self, piece: &Piece) -> Board {
        let mut board = self.clone();
        for (x, y) in piece.cells() {
            if (0..BOARD_WIDTH as i32).contains(&x) && (0..BOARD_HEIGHT as i32).contains(&y) {
                board.cells[y as usize][x as usize] = Some(piece.kind);
            }
        }
        board
    }

    /// Removes every completely filled row, packs the remaining rows toward
    /// the bottom and pads fresh empty rows on top. Returns the compacted
    /// board together with the number of rows removed.
    pub fn clear_full_rows(&self) -> (Board, u32) {
        let kept: Vec<_> = self
            .cells
            .iter()
            .filter(|row| row.iter().any(|cell| cell.is_none()))
            .copied()
            .collect();
        let cleared = (BOARD_HEIGHT - kept.len()) as u32;
        let mut board = Board::empty();
        let top = BOARD_HEIGHT - kept.len();
        for (i, row) in kept.into_iter().enumerate() {
            board.cells[top + i] = row;
        }
        (board, cleared)
    }

    /// Anchor row the piece would settle on if dropped straight down.
    pub fn ghost_row(&self, piece: &Piece) -> i32 {
        let mut dy = 0;
        while self.is_valid_position(piece, 0, dy + 1) {
            dy += 1;
        }
        piece.y + dy
    }

    /// Display composite: settled cells, then the ghost landing hint, then
    /// the falling piece on top. The ghost only fills empty cells and is
    /// skipped entirely when the piece already rests on its landing row.
    pub fn with_overlay(&self, piece: Option<&Piece>) -> [[Tile; BOARD_WIDTH]; BOARD_HEIGHT] {
        let mut tiles = [[Tile::Empty; BOARD_WIDTH]; BOARD_HEIGHT];
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(kind) = cell {
                    tiles[y][x] = Tile::Filled(*kind);
                }
            }
        }

        if let Some(piece) = piece {
            let ghost_row = self.ghost_row(piece);
            if ghost_row != piece.y {
                let ghost = Piece {
                    y: ghost_row,
                    ..*piece
                };
                for (x, y) in ghost.cells() {
                    if (0..BOARD_WIDTH as i32).contains(&x)
                        && (0..BOARD_HEIGHT as i32).contains(&y)
                        && tiles[y as usize][x as usize] == Tile::Empty
                    {
                        tiles[y as usize][x as usize] = Tile::Ghost;
                    }
                }
            }
            for (x, y) in piece.cells() {
                if (0..BOARD_WIDTH as i32).contains(&x) && (0..BOARD_HEIGHT as i32).contains(&y) {
                    tiles[y as usize][x as usize] = Tile::Filled(piece.kind);
                }
            }
        }

        tiles
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
impl Board {
    /// Direct cell access for building test fixtures.
    pub(crate) fn set_cell(&mut self, x: usize, y: usize, kind: Option<PieceKind>) {
        self.cells[y][x] = kind;
    }
}
