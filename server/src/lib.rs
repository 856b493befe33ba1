//! # Relay Server Library
//!
//! This library provides the relay server for the multiplayer falling-block
//! game. It tracks the lobby roster, fans out per-player board snapshots to
//! every other participant, and forwards call signaling blobs between peers
//! so that clients can negotiate their own media connections.
//!
//! ## Core Responsibilities
//!
//! ### Lobby Tracking
//! The relay owns the canonical participant table. Every join is recorded
//! with a username and avatar (generated server-side when the client leaves
//! them blank), and the full roster is re-broadcast whenever membership
//! changes so that late joiners and survivors always converge on the same
//! view.
//!
//! ### State Fan-Out
//! Each client simulates its own board locally and reports snapshots to the
//! relay. The relay does not simulate anything; it stores the latest snapshot
//! per participant and forwards each update as a delta to everyone except the
//! sender. Snapshots from clients that never joined are discarded.
//!
//! ### Call Signaling
//! Video-call setup messages (offers, answers, candidates) are treated as
//! opaque blobs and routed to a single addressed participant. Join and leave
//! notices are broadcast so clients can decide among themselves which side of
//! each peer pair initiates.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All state lives in one task. Per-connection reader and writer tasks only
//! move bytes; everything they learn is funneled through a single event
//! channel into the relay loop, which applies it sequentially. No mutexes,
//! no lock ordering, and broadcasts observe a consistent roster.
//!
//! ### TCP-Based Communication
//! Clients connect over TCP and exchange length-prefixed binary frames.
//! Ordering and delivery matter more than latency here: a lost roster update
//! would desynchronize the lobby permanently, so a reliable stream is the
//! right transport.
//!
//! ### Connection Lifecycle
//! Each accepted socket is split into a reader task and a writer task. The
//! reader parses frames into relay events until the peer hangs up or sends
//! garbage; the writer drains a per-connection queue. When either side stops,
//! the relay receives exactly one disconnect event and cleans up the
//! participant, notifying the survivors.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Connection plumbing:
//! - TCP accept loop and per-connection task spawning
//! - Frame decoding into relay events
//! - Outbound queue draining per connection
//! - Connection identifier generation
//!
//! ### Relay Module (`relay`)
//! The event loop and routing policy:
//! - Greeting each connection with its assigned identifier
//! - Roster broadcasts on join and leave
//! - Delta forwarding of board snapshots
//! - Call notice broadcasts and addressed signal delivery
//!
//! ### Roster Module (`roster`)
//! The participant table:
//! - Join, leave, and snapshot bookkeeping
//! - Username and avatar generation for anonymous joiners
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::relay;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Bind the relay and serve until the process is stopped. The relay
//!     // accepts connections, tracks the lobby, and routes game state and
//!     // call signaling between all connected clients.
//!     relay::serve("127.0.0.1:8080").await
//! }
//! ```
//!
//! ## Operational Notes
//!
//! Frames are capped at 64 KiB; anything larger is treated as a protocol
//! error and the offending connection is dropped. Slow or dead connections
//! never block the loop: sends go through unbounded per-connection queues,
//! and queues whose reader task has exited are pruned on the next broadcast.

pub mod network;
pub mod relay;
pub mod roster;
