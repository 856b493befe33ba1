//! # Game Client Library
//!
//! This library provides the complete client-side implementation of the
//! multiplayer falling-block game. It covers input capture, the locally
//! simulated board, replication of other players' boards through the relay,
//! call signaling between peers, and rendering.
//!
//! ## Architecture Overview
//!
//! Unlike an authoritative-server design, every client here simulates only
//! its own board and shares the result. The relay never judges a move; it
//! mirrors whatever each client reports to everyone else. That keeps input
//! latency at zero and makes the relay trivially simple, at the cost of
//! trusting clients, which is the right trade for a living-room game among
//! friends.
//!
//! ### Local Simulation
//! All piece movement, rotation, line clearing and scoring run locally
//! against the rules in the shared crate. Gravity is driven by a polled
//! scheduler whose cadence follows the current level, so the simulation
//! needs nothing from the event loop except a timestamp each frame.
//!
//! ### Snapshot Replication
//! After every frame the client compares its board state with the last one
//! it reported and sends a snapshot only when something changed. Remote
//! boards arrive the same way, as whole snapshots, so a lost connection
//! never leaves a remote board half-updated.
//!
//! ### Call Signaling
//! Clients negotiate peer media links among themselves using opaque blobs
//! forwarded by the relay. Both sides of every pair apply the same rule,
//! the lexicographically lower id initiates, so exactly one side makes the
//! offer no matter the order in which join notices arrive.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side game state management:
//! - The locally simulated board and its gravity schedule
//! - Change detection for outbound snapshots
//! - The lobby view of every other participant
//!
//! ### Input Module (`input`)
//! Keyboard handling:
//! - Edge detection for rotate, hard drop, pause and start
//! - Hold-to-repeat for the steering keys
//! - Cancellation of repeats when play stops
//!
//! ### Network Module (`network`)
//! The relay connection:
//! - A dedicated networking thread with its own async runtime
//! - Channel-based handoff to and from the render loop
//! - Connection loss detection
//!
//! ### Rendering Module (`rendering`)
//! The macroquad presentation:
//! - Local board with ghost projection and next-piece preview
//! - Remote mini boards with identity labels and call badges
//! - Mode overlays and the status line
//!
//! ### Rtc Module (`rtc`)
//! Peer call management:
//! - Call membership and initiator tie-breaking
//! - Signal routing per remote participant
//! - Pluggable peer and media implementations
//!
//! ### Timer Module (`timer`)
//! Frame-polled scheduling used by gravity and key repeat.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::{Lobby, LocalGame};
//! use client::input::{sample_keys, InputController};
//! use std::time::Instant;
//!
//! let mut game = LocalGame::new();
//! let mut controller = InputController::new();
//! let lobby = Lobby::new();
//!
//! // One iteration of the frame loop: sample the keyboard, apply the
//! // actions it produced, then let gravity catch up before rendering.
//! let now = Instant::now();
//! for action in controller.update(sample_keys(), now, game.state()) {
//!     game.apply(action, now);
//! }
//! game.poll_gravity(now);
//! let _others = lobby.remotes();
//! ```
//!
//! ## Design Philosophy
//!
//! ### Responsiveness First
//! Every action lands on the local board in the same frame it was pressed.
//! Nothing a remote peer or the relay does can delay local play.
//!
//! ### Shared Rules
//! The board and scoring rules live in the shared crate, so any two clients
//! fed the same inputs produce identical boards and every participant
//! renders remote boards with the same rules it plays by.
//!
//! ### Graceful Degradation
//! Losing the relay connection leaves the local game fully playable and the
//! status line says what happened. A missing capture device degrades a call
//! to signaling-only rather than blocking it.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod rtc;
pub mod timer;
