use clap::Parser;
use client::game::{Lobby, LocalGame};
use client::input::{sample_keys, InputController};
use client::network::Session;
use client::rendering::{FrameInfo, Renderer};
use client::rtc::{CallManager, NoMedia, StubPeerFactory};
use log::info;
use macroquad::prelude::*;
use shared::ClientMessage;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Username shown to other players (generated when omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// Avatar shown to other players (generated when omitted)
    #[arg(short, long)]
    avatar: Option<String>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Block Party".to_string(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to relay at {}", args.server);
    info!("Controls: arrows move, Space rotates, Tab drops, Esc pauses, Enter starts");
    info!("Press V to join or leave the call");

    let mut session = Session::connect(
        &args.server,
        ClientMessage::Join {
            username: args.username,
            avatar: args.avatar,
        },
    );
    let mut game = LocalGame::new();
    let mut controller = InputController::new();
    let mut lobby = Lobby::new();
    let mut call = CallManager::new(StubPeerFactory, NoMedia);
    let renderer = Renderer::new();

    loop {
        let now = Instant::now();

        for action in controller.update(sample_keys(), now, game.state()) {
            game.apply(action, now);
        }
        game.poll_gravity(now);

        if is_key_pressed(KeyCode::V) {
            if call.in_call() {
                call.leave_call();
            } else {
                call.join_call();
            }
        }

        for message in session.poll() {
            lobby.apply(&message);
            call.handle_message(&message);
        }

        call.poll();
        for message in call.drain_outbox() {
            session.send(message);
        }

        if let Some(state) = game.take_update_if_changed() {
            session.send(ClientMessage::StateUpdate { state });
        }

        let frame = FrameInfo::new(
            game.state(),
            &lobby,
            session.is_connected(),
            call.in_call(),
            |id| call.is_peered(id),
        );
        renderer.render(&frame);

        next_frame().await;
    }
}
