use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::piece::{Piece, PieceKind};

pub const INITIAL_DROP_MS: u64 = 1000;
pub const MIN_DROP_MS: u64 = 50;
pub const DROP_DECREASE_MS: u64 = 50;
pub const LINES_PER_LEVEL: u32 = 10;

const SOFT_DROP_POINTS: u32 = 1;
const HARD_DROP_POINTS: u32 = 2;

// Probed in order when a plain rotation collides: left, right, up, then the
// two diagonals. The first legal offset wins.
const WALL_KICKS: [(i32, i32); 5] = [(-1, 0), (1, 0), (0, -1), (-1, -1), (1, -1)];

/// Everything a player can ask the simulation to do. Piece-steering actions
/// are silently ignored unless the game is actively playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Start,
    Pause,
    Resume,
    Restart,
    MoveLeft,
    MoveRight,
    MoveDown,
    Rotate,
    Drop,
}

/// One player's complete simulation state. The relay ships this whole value
/// around, so everything a remote view needs lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub current: Option<Piece>,
    pub next: Option<Piece>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub playing: bool,
    pub paused: bool,
    pub game_over: bool,
}

impl GameState {
    /// Fresh idle state with the first two pieces already dealt.
    pub fn new() -> Self {
        Self {
            current: Some(Piece::spawn(PieceKind::random())),
            next: Some(Piece::spawn(PieceKind::random())),
            ..Self::blank()
        }
    }

    /// Placeholder for a player who has not reported any state yet. No
    /// pieces dealt, nothing running.
    pub fn blank() -> Self {
        Self {
            board: Board::empty(),
            current: None,
            next: None,
            score: 0,
            level: 0,
            lines: 0,
            playing: false,
            paused: false,
            game_over: false,
        }
    }

    /// True while piece-steering actions and gravity are accepted.
    pub fn is_active(&self) -> bool {
        self.playing && !self.paused && !self.game_over
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Start => self.start(),
            Action::Pause => {
                if self.playing && !self.game_over {
                    self.paused = true;
                }
            }
            Action::Resume => {
                if self.playing && !self.game_over {
                    self.paused = false;
                }
            }
            Action::Restart => *self = GameState::new(),
            Action::MoveLeft => self.shift(-1),
            Action::MoveRight => self.shift(1),
            Action::MoveDown => self.soft_drop(),
            Action::Rotate => self.rotate(),
            Action::Drop => self.hard_drop(),
        }
    }

    /// One gravity step: descend the current piece or lock it. Same as a
    /// soft drop except no point is awarded.
    pub fn tick(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(piece) = self.current {
            if self.board.is_valid_position(&piece, 0, 1) {
                self.current = Some(piece.offset(0, 1));
            } else {
                self.lock_current();
            }
        }
    }

    /// Begins play. After a game over the whole game is dealt fresh first,
    /// so the finished board never bleeds into the new round.
    fn start(&mut self) {
        if self.game_over {
            *self = GameState::new();
        }
        self.playing = true;
        self.paused = false;
    }

    fn shift(&mut self, dx: i32) {
        if !self.is_active() {
            return;
        }
        if let Some(piece) = self.current {
            if self.board.is_valid_position(&piece, dx, 0) {
                self.current = Some(piece.offset(dx, 0));
            }
        }
    }

    fn soft_drop(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(piece) = self.current {
            if self.board.is_valid_position(&piece, 0, 1) {
                self.current = Some(piece.offset(0, 1));
                self.score += SOFT_DROP_POINTS;
            } else {
                self.lock_current();
            }
        }
    }

    fn rotate(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(piece) = self.current {
            let rotated = piece.rotated();
            if self.board.is_valid_position(&rotated, 0, 0) {
                self.current = Some(rotated);
                return;
            }
            for (dx, dy) in WALL_KICKS {
                if self.board.is_valid_position(&rotated, dx, dy) {
                    self.current = Some(rotated.offset(dx, dy));
                    return;
                }
            }
        }
    }

    fn hard_drop(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(piece) = self.current {
            let mut dropped = piece;
            let mut distance = 0;
            while self.board.is_valid_position(&dropped, 0, 1) {
                dropped = dropped.offset(0, 1);
                distance += 1;
            }
            self.current = Some(dropped);
            self.score += distance * HARD_DROP_POINTS;
            self.lock_current();
        }
    }

    /// Stamps the current piece, clears lines, scores them with the level
    /// from before the clear, then promotes the next piece. A promoted
    /// piece that does not fit at spawn ends the game.
    fn lock_current(&mut self) {
        if let Some(piece) = self.current.take() {
            let (board, cleared) = self.board.with_piece(&piece).clear_full_rows();
            self.board = board;
            self.score += line_points(cleared) * (self.level + 1);
            self.lines += cleared;
            self.level = self.lines / LINES_PER_LEVEL;
            self.spawn_from_next();
        }
    }

    fn spawn_from_next(&mut self) {
        if let Some(next) = self.next {
            let fresh = Piece::spawn(next.kind);
            self.current = Some(fresh);
            self.next = Some(Piece::spawn(PieceKind::random()));
            if !self.board.is_valid_position(&fresh, 0, 0) {
                self.game_over = true;
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

fn line_points(cleared: u32) -> u32 {
    match cleared {
        1 => 40,
        2 => 100,
        3 => 300,
        4 => 1200,
        _ => 0,
    }
}

/// Gravity period for a level. Speeds up by 50 ms per level and bottoms out
/// at 50 ms.
pub fn drop_interval(level: u32) -> Duration {
    let ms = INITIAL_DROP_MS.saturating_sub(level as u64 * DROP_DECREASE_MS);
    Duration::from_millis(ms.max(MIN_DROP_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};

    fn active_state(kind: PieceKind) -> GameState {
        let mut state = GameState::new();
        state.current = Some(Piece::spawn(kind));
        state.next = Some(Piece::spawn(PieceKind::O));
        state.playing = true;
        state
    }

    fn fill_row_except(state: &mut GameState, y: usize, skip: &[usize]) {
        for x in 0..BOARD_WIDTH {
            if !skip.contains(&x) {
                state.board.set_cell(x, y, Some(PieceKind::J));
            }
        }
    }

    #[test]
    fn test_new_state_is_idle_with_pieces_dealt() {
        let state = GameState::new();
        assert!(state.current.is_some());
        assert!(state.next.is_some());
        assert!(!state.playing);
        assert!(!state.paused);
        assert!(!state.game_over);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 0);
        assert_eq!(state.lines, 0);
        assert!(!state.is_active());
    }

    #[test]
    fn test_steering_ignored_before_start() {
        let mut state = GameState::new();
        let before = state.clone();
        for action in [
            Action::MoveLeft,
            Action::MoveRight,
            Action::MoveDown,
            Action::Rotate,
            Action::Drop,
        ] {
            state.apply(action);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_start_begins_play() {
        let mut state = GameState::new();
        state.apply(Action::Start);
        assert!(state.playing);
        assert!(state.is_active());
    }

    #[test]
    fn test_pause_blocks_steering_and_resume_unblocks() {
        let mut state = active_state(PieceKind::T);
        state.apply(Action::Pause);
        assert!(state.paused);
        let before = state.clone();
        state.apply(Action::MoveLeft);
        state.apply(Action::Rotate);
        state.apply(Action::Drop);
        assert_eq!(state, before);

        state.apply(Action::Resume);
        assert!(!state.paused);
        state.apply(Action::MoveLeft);
        assert_eq!(state.current.map(|piece| piece.x), Some(2));
    }

    #[test]
    fn test_pause_ignored_when_idle_or_over() {
        let mut state = GameState::new();
        state.apply(Action::Pause);
        assert!(!state.paused);

        let mut over = active_state(PieceKind::T);
        over.game_over = true;
        over.apply(Action::Pause);
        assert!(!over.paused);
    }

    #[test]
    fn test_restart_resets_to_idle() {
        let mut state = active_state(PieceKind::T);
        state.score = 500;
        state.lines = 12;
        state.level = 1;
        state.apply(Action::Restart);
        assert!(!state.playing);
        assert!(!state.game_over);
        assert_eq!(state.score, 0);
        assert_eq!(state.lines, 0);
        assert_eq!(state.level, 0);
        assert_eq!(state.board, Board::empty());
        assert!(state.current.is_some());
    }

    #[test]
    fn test_horizontal_movement_stops_at_walls() {
        let mut state = active_state(PieceKind::O);
        for _ in 0..20 {
            state.apply(Action::MoveLeft);
        }
        assert_eq!(state.current.map(|piece| piece.x), Some(0));
        for _ in 0..20 {
            state.apply(Action::MoveRight);
        }
        assert_eq!(state.current.map(|piece| piece.x), Some(8));
    }

    #[test]
    fn test_soft_drop_descends_and_scores() {
        let mut state = active_state(PieceKind::T);
        state.apply(Action::MoveDown);
        assert_eq!(state.current.map(|piece| piece.y), Some(1));
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_soft_drop_on_floor_locks_without_point() {
        let mut state = active_state(PieceKind::O);
        state.current = Some(Piece {
            kind: PieceKind::O,
            rotation: 0,
            x: 0,
            y: 18,
        });
        state.apply(Action::MoveDown);
        assert_eq!(state.score, 0);
        assert_eq!(state.board.cell(0, 18), Some(PieceKind::O));
        assert_eq!(state.board.cell(1, 19), Some(PieceKind::O));
        assert_eq!(state.current.map(|piece| piece.kind), Some(PieceKind::O));
        assert_eq!(state.current.map(|piece| piece.y), Some(0));
    }

    #[test]
    fn test_tick_descends_without_points() {
        let mut state = active_state(PieceKind::T);
        state.tick();
        assert_eq!(state.current.map(|piece| piece.y), Some(1));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_tick_ignored_while_paused() {
        let mut state = active_state(PieceKind::T);
        state.paused = true;
        let before = state.clone();
        state.tick();
        assert_eq!(state, before);
    }

    #[test]
    fn test_tick_locks_on_floor() {
        let mut state = active_state(PieceKind::O);
        state.current = Some(Piece {
            kind: PieceKind::O,
            rotation: 0,
            x: 4,
            y: 18,
        });
        state.tick();
        assert_eq!(state.board.cell(4, 19), Some(PieceKind::O));
        assert_eq!(state.current.map(|piece| piece.y), Some(0));
    }

    #[test]
    fn test_four_rotations_return_to_start() {
        let mut state = active_state(PieceKind::J);
        let start = state.current;
        for _ in 0..4 {
            state.apply(Action::Rotate);
        }
        assert_eq!(state.current, start);
    }

    #[test]
    fn test_rotation_kicks_off_left_wall() {
        let mut state = active_state(PieceKind::T);
        state.current = Some(Piece {
            kind: PieceKind::T,
            rotation: 1,
            x: -1,
            y: 5,
        });
        state.apply(Action::Rotate);
        let piece = state.current.unwrap();
        assert_eq!(piece.rotation, 2);
        assert_eq!(piece.x, 0);
        assert_eq!(piece.y, 5);
    }

    #[test]
    fn test_rotation_kicks_up_off_floor() {
        let mut state = active_state(PieceKind::T);
        state.current = Some(Piece {
            kind: PieceKind::T,
            rotation: 0,
            x: 4,
            y: 18,
        });
        state.apply(Action::Rotate);
        let piece = state.current.unwrap();
        assert_eq!(piece.rotation, 1);
        assert_eq!(piece.x, 4);
        assert_eq!(piece.y, 17);
    }

    #[test]
    fn test_rotation_with_no_room_is_noop() {
        let mut state = active_state(PieceKind::I);
        let wedged = Piece {
            kind: PieceKind::I,
            rotation: 1,
            x: -2,
            y: 5,
        };
        state.current = Some(wedged);
        state.apply(Action::Rotate);
        assert_eq!(state.current, Some(wedged));
    }

    #[test]
    fn test_hard_drop_locks_on_bottom_row() {
        let mut state = active_state(PieceKind::I);
        state.apply(Action::Drop);
        for x in 3..7 {
            assert_eq!(state.board.cell(x, BOARD_HEIGHT - 1), Some(PieceKind::I));
        }
        assert_eq!(state.score, 36);
        assert_eq!(state.current.map(|piece| piece.kind), Some(PieceKind::O));
    }

    #[test]
    fn test_single_clear_scores_forty_at_level_zero() {
        let mut state = active_state(PieceKind::I);
        fill_row_except(&mut state, 19, &[3, 4, 5, 6]);
        state.apply(Action::Drop);
        assert_eq!(state.score, 36 + 40);
        assert_eq!(state.lines, 1);
        assert_eq!(state.level, 0);
        for x in 0..BOARD_WIDTH {
            assert_eq!(state.board.cell(x, 19), None);
        }
    }

    #[test]
    fn test_tetris_scores_with_pre_clear_level() {
        let mut state = active_state(PieceKind::I);
        state.current = Some(Piece {
            kind: PieceKind::I,
            rotation: 1,
            x: 7,
            y: 0,
        });
        for y in 16..20 {
            fill_row_except(&mut state, y, &[9]);
        }
        state.apply(Action::Drop);
        assert_eq!(state.score, 32 + 1200);
        assert_eq!(state.lines, 4);
        assert_eq!(state.level, 0);

        let mut leveled = active_state(PieceKind::I);
        leveled.current = Some(Piece {
            kind: PieceKind::I,
            rotation: 1,
            x: 7,
            y: 0,
        });
        leveled.lines = 10;
        leveled.level = 1;
        for y in 16..20 {
            fill_row_except(&mut leveled, y, &[9]);
        }
        leveled.apply(Action::Drop);
        assert_eq!(leveled.score, 32 + 2400);
        assert_eq!(leveled.lines, 14);
        assert_eq!(leveled.level, 1);
    }

    #[test]
    fn test_level_advances_on_line_threshold() {
        let mut state = active_state(PieceKind::I);
        state.lines = 22;
        state.level = 2;
        fill_row_except(&mut state, 19, &[3, 4, 5, 6]);
        state.apply(Action::Drop);
        assert_eq!(state.lines, 23);
        assert_eq!(state.level, 2);
        assert_eq!(state.score, 36 + 40 * 3);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut state = active_state(PieceKind::O);
        state.next = Some(Piece::spawn(PieceKind::O));
        fill_row_except(&mut state, 0, &[0, 1, 2]);
        fill_row_except(&mut state, 1, &[0, 1, 2]);
        state.current = Some(Piece {
            kind: PieceKind::O,
            rotation: 0,
            x: 0,
            y: 18,
        });
        state.tick();
        assert!(state.game_over);
        assert!(!state.is_active());
        assert!(state.current.is_some());
        assert!(state.next.is_some());

        let before = state.clone();
        state.apply(Action::MoveLeft);
        state.apply(Action::Drop);
        assert_eq!(state, before);
    }

    #[test]
    fn test_start_after_game_over_deals_fresh_game() {
        let mut state = active_state(PieceKind::O);
        state.score = 900;
        state.lines = 15;
        state.level = 1;
        state.game_over = true;
        state.board.set_cell(4, 10, Some(PieceKind::Z));
        state.apply(Action::Start);
        assert!(state.playing);
        assert!(!state.game_over);
        assert_eq!(state.score, 0);
        assert_eq!(state.lines, 0);
        assert_eq!(state.level, 0);
        assert_eq!(state.board, Board::empty());
    }

    #[test]
    fn test_drop_interval_speeds_up_and_bottoms_out() {
        assert_eq!(drop_interval(0), Duration::from_millis(1000));
        assert_eq!(drop_interval(1), Duration::from_millis(950));
        assert_eq!(drop_interval(19), Duration::from_millis(50));
        assert_eq!(drop_interval(20), Duration::from_millis(50));
        assert_eq!(drop_interval(100), Duration::from_millis(50));
    }
}
