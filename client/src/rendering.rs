use crate::game::Lobby;
use macroquad::prelude::*;
use shared::{GameState, Participant, Piece, Tile, BOARD_HEIGHT, BOARD_WIDTH, GHOST_COLOR};

/// Cell size of the local board in pixels.
const CELL: f32 = 30.0;
/// Cell size of the remote mini boards.
const MINI_CELL: f32 = 12.0;
/// Top-left corner of the local board.
const BOARD_X: f32 = 40.0;
const BOARD_Y: f32 = 60.0;
/// Left edge of the side panel with the preview and counters.
const PANEL_X: f32 = BOARD_X + BOARD_WIDTH as f32 * CELL + 30.0;
/// Left edge of the remote board area.
const REMOTES_X: f32 = PANEL_X + 190.0;

/// One remote participant prepared for drawing.
pub struct RemoteView<'a> {
    pub participant: &'a Participant,
    pub on_call: bool,
}

/// Everything one frame needs.
pub struct FrameInfo<'a> {
    pub local: &'a GameState,
    pub remotes: Vec<RemoteView<'a>>,
    pub connected: bool,
    pub in_call: bool,
}

impl<'a> FrameInfo<'a> {
    /// Assembles the frame from the lobby view, with `on_call` decided by
    /// the caller per participant.
    pub fn new(
        local: &'a GameState,
        lobby: &'a Lobby,
        connected: bool,
        in_call: bool,
        mut peered: impl FnMut(&str) -> bool,
    ) -> Self {
        let remotes = lobby
            .remotes()
            .into_iter()
            .map(|participant| RemoteView {
                on_call: peered(&participant.id),
                participant,
            })
            .collect();
        Self {
            local,
            remotes,
            connected,
            in_call,
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&self, frame: &FrameInfo) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_board(BOARD_X, BOARD_Y, CELL, frame.local, true);
        self.draw_panel(frame.local);
        self.draw_mode_overlay(frame.local);
        self.draw_remotes(&frame.remotes);
        self.draw_status_line(frame);
    }

    /// Draws one board with its settled tiles and falling piece. The ghost
    /// projection only appears on the local board.
    fn draw_board(&self, x: f32, y: f32, cell: f32, state: &GameState, show_ghost: bool) {
        let width = BOARD_WIDTH as f32 * cell;
        let height = BOARD_HEIGHT as f32 * cell;
        draw_rectangle(x, y, width, height, Color::from_rgba(17, 17, 17, 255));

        let overlay = state.board.with_overlay(state.current.as_ref());
        for (row, tiles) in overlay.iter().enumerate() {
            for (col, tile) in tiles.iter().enumerate() {
                let color = match tile {
                    Tile::Empty => continue,
                    Tile::Ghost if !show_ghost => continue,
                    Tile::Ghost => rgb(GHOST_COLOR),
                    Tile::Filled(kind) => rgb(kind.color()),
                };
                draw_rectangle(
                    x + col as f32 * cell + 1.0,
                    y + row as f32 * cell + 1.0,
                    cell - 2.0,
                    cell - 2.0,
                    color,
                );
            }
        }

        draw_rectangle_lines(x, y, width, height, 2.0, Color::from_rgba(68, 68, 68, 255));
    }

    fn draw_panel(&self, state: &GameState) {
        draw_text("NEXT", PANEL_X, BOARD_Y + 20.0, 24.0, WHITE);
        let preview_y = BOARD_Y + 35.0;
        draw_rectangle(
            PANEL_X,
            preview_y,
            4.0 * 22.0,
            4.0 * 22.0,
            Color::from_rgba(17, 17, 17, 255),
        );
        if let Some(next) = state.next {
            self.draw_piece_preview(PANEL_X, preview_y, 22.0, &next);
        }

        let counters_y = preview_y + 4.0 * 22.0 + 45.0;
        draw_text(
            &format!("Score  {}", state.score),
            PANEL_X,
            counters_y,
            24.0,
            WHITE,
        );
        draw_text(
            &format!("Level  {}", state.level),
            PANEL_X,
            counters_y + 30.0,
            24.0,
            WHITE,
        );
        draw_text(
            &format!("Lines  {}", state.lines),
            PANEL_X,
            counters_y + 60.0,
            24.0,
            WHITE,
        );
    }

    fn draw_piece_preview(&self, x: f32, y: f32, cell: f32, piece: &Piece) {
        let color = rgb(piece.kind.color());
        for (dx, dy) in piece.kind.offsets(0) {
            draw_rectangle(
                x + dx as f32 * cell + 1.0,
                y + dy as f32 * cell + 1.0,
                cell - 2.0,
                cell - 2.0,
                color,
            );
        }
    }

    fn draw_mode_overlay(&self, state: &GameState) {
        let (title, hint) = if state.game_over {
            ("GAME OVER", "Press Enter to play again")
        } else if state.paused {
            ("PAUSED", "Press Escape or Enter to resume")
        } else if !state.playing {
            ("BLOCK PARTY", "Press Enter to start")
        } else {
            return;
        };

        let width = BOARD_WIDTH as f32 * CELL;
        let height = BOARD_HEIGHT as f32 * CELL;
        draw_rectangle(BOARD_X, BOARD_Y, width, height, Color::new(0.0, 0.0, 0.0, 0.6));

        let center_x = BOARD_X + width / 2.0;
        self.draw_centered(title, center_x, BOARD_Y + height / 2.0 - 20.0, 40.0, WHITE);
        if state.game_over {
            self.draw_centered(
                &format!("Final score {}", state.score),
                center_x,
                BOARD_Y + height / 2.0 + 15.0,
                22.0,
                WHITE,
            );
        }
        self.draw_centered(
            hint,
            center_x,
            BOARD_Y + height / 2.0 + 45.0,
            20.0,
            Color::from_rgba(170, 170, 170, 255),
        );
    }

    fn draw_centered(&self, text: &str, center_x: f32, y: f32, size: f32, color: Color) {
        let dimensions = measure_text(text, None, size as u16, 1.0);
        draw_text(text, center_x - dimensions.width / 2.0, y, size, color);
    }

    fn draw_remotes(&self, remotes: &[RemoteView]) {
        let mini_height = BOARD_HEIGHT as f32 * MINI_CELL;
        let slot_width = BOARD_WIDTH as f32 * MINI_CELL + 30.0;
        let slot_height = mini_height + 60.0;

        for (i, remote) in remotes.iter().take(6).enumerate() {
            let column = i % 2;
            let row = i / 2;
            let x = REMOTES_X + column as f32 * slot_width;
            let y = BOARD_Y + row as f32 * slot_height;
            let state = &remote.participant.game;

            draw_text(
                &format!(
                    "{} {}",
                    remote.participant.avatar, remote.participant.username
                ),
                x,
                y - 8.0,
                18.0,
                WHITE,
            );
            self.draw_board(x, y, MINI_CELL, state, false);
            if remote.on_call {
                draw_rectangle_lines(
                    x - 2.0,
                    y - 2.0,
                    BOARD_WIDTH as f32 * MINI_CELL + 4.0,
                    mini_height + 4.0,
                    2.0,
                    GREEN,
                );
            }

            let footer = if state.game_over {
                format!("{} - out", state.score)
            } else {
                format!("{}", state.score)
            };
            draw_text(&footer, x, y + mini_height + 18.0, 18.0, GRAY);
        }
    }

    fn draw_status_line(&self, frame: &FrameInfo) {
        let y = screen_height() - 16.0;
        let status = if !frame.connected {
            "Offline, relay connection lost".to_string()
        } else if frame.in_call {
            format!("{} others in room, on call (V to leave)", frame.remotes.len())
        } else {
            format!("{} others in room, V to join call", frame.remotes.len())
        };
        draw_text(&status, BOARD_X, y, 18.0, GRAY);
        draw_text(
            "Arrows move, Space rotates, Tab drops, Esc pauses",
            BOARD_X,
            y - 20.0,
            18.0,
            Color::from_rgba(119, 119, 119, 255),
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::from_rgba(r, g, b, 255)
}
