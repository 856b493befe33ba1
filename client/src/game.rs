//! Local board simulation and the replicated view of other players

use crate::timer::Scheduler;
use log::{debug, info};
use shared::{drop_interval, Action, GameState, Participant, ParticipantId, ServerMessage};
use std::collections::HashMap;
use std::time::Instant;

/// Timer token for the gravity tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GravityTimer;

/// The locally simulated game plus its gravity schedule.
///
/// Gravity runs only while the game is actively playing, at the cadence the
/// current level dictates. The schedule restarts whenever the level changes
/// or play resumes, so the first tick after a resume always waits a full
/// interval.
pub struct LocalGame {
    state: GameState,
    last_sent: GameState,
    gravity: Scheduler<GravityTimer>,
    scheduled_level: Option<u32>,
}

impl LocalGame {
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
            // The relay's initial record for us is blank, so the first
            // change poll pushes the freshly dealt pieces.
            last_sent: GameState::blank(),
            gravity: Scheduler::new(),
            scheduled_level: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Applies one action and reconciles the gravity schedule.
    pub fn apply(&mut self, action: Action, now: Instant) {
        self.state.apply(action);
        self.reschedule(now);
    }

    /// Runs every gravity tick that has come due.
    pub fn poll_gravity(&mut self, now: Instant) {
        for _ in self.gravity.poll(now) {
            if !self.state.is_active() {
                break;
            }
            self.state.tick();
            self.reschedule(now);
        }
    }

    /// Returns the state for broadcast when it differs from the last one
    /// sent.
    pub fn take_update_if_changed(&mut self) -> Option<GameState> {
        if self.state != self.last_sent {
            self.last_sent = self.state.clone();
            Some(self.state.clone())
        } else {
            None
        }
    }

    fn reschedule(&mut self, now: Instant) {
        if self.state.is_active() {
            let level = self.state.level;
            if self.scheduled_level != Some(level) {
                let interval = drop_interval(level);
                self.gravity
                    .schedule_repeating(GravityTimer, now, interval, interval);
                self.scheduled_level = Some(level);
                debug!("Gravity interval {:?} at level {}", interval, level);
            }
        } else if self.scheduled_level.is_some() {
            self.gravity.cancel(GravityTimer);
            self.scheduled_level = None;
        }
    }
}

impl Default for LocalGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the relay has told us about the room.
pub struct Lobby {
    pub my_id: Option<ParticipantId>,
    pub participants: HashMap<ParticipantId, Participant>,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            my_id: None,
            participants: HashMap::new(),
        }
    }

    /// Folds one relay message into the lobby view. Call signaling messages
    /// are not the lobby's concern and pass through untouched.
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Connected { id } => {
                info!("Assigned participant id {}", id);
                self.my_id = Some(id.clone());
            }
            ServerMessage::Roster { participants } => {
                debug!("Roster update with {} participants", participants.len());
                self.participants = participants.clone();
            }
            ServerMessage::StateUpdate { id, state } => {
                if let Some(participant) = self.participants.get_mut(id) {
                    participant.game = state.clone();
                } else {
                    debug!("State update for unknown participant {}", id);
                }
            }
            ServerMessage::RemoteAction { id, action } => {
                debug!("Participant {} performed {:?}", id, action);
            }
            ServerMessage::CallJoined { .. }
            | ServerMessage::CallIncoming { .. }
            | ServerMessage::CallLeft { .. }
            | ServerMessage::RtcSignal { .. } => {}
        }
    }

    /// Other participants in a stable order for rendering.
    pub fn remotes(&self) -> Vec<&Participant> {
        let mut others: Vec<&Participant> = self
            .participants
            .values()
            .filter(|participant| Some(&participant.id) != self.my_id.as_ref())
            .collect();
        others.sort_by(|a, b| a.id.cmp(&b.id));
        others
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MS: Duration = Duration::from_millis(1);

    fn participant(id: &str) -> Participant {
        Participant {
            id: id.to_string(),
            username: format!("Player{}", id),
            avatar: "🐙".to_string(),
            game: GameState::blank(),
            connected: true,
        }
    }

    fn roster_of(ids: &[&str]) -> ServerMessage {
        let participants = ids
            .iter()
            .map(|id| (id.to_string(), participant(id)))
            .collect();
        ServerMessage::Roster { participants }
    }

    fn piece_y(game: &LocalGame) -> i32 {
        game.state().current.map(|piece| piece.y).unwrap_or(-1)
    }

    #[test]
    fn test_gravity_waits_a_full_interval() {
        let now = Instant::now();
        let mut game = LocalGame::new();
        game.apply(Action::Start, now);

        game.poll_gravity(now + 999 * MS);
        assert_eq!(piece_y(&game), 0);

        game.poll_gravity(now + 1000 * MS);
        assert_eq!(piece_y(&game), 1);
    }

    #[test]
    fn test_no_gravity_before_start() {
        let now = Instant::now();
        let mut game = LocalGame::new();

        game.poll_gravity(now + 5000 * MS);
        assert_eq!(piece_y(&game), 0);
    }

    #[test]
    fn test_pause_stops_gravity_and_resume_restarts_it() {
        let now = Instant::now();
        let mut game = LocalGame::new();
        game.apply(Action::Start, now);
        game.apply(Action::Pause, now + 500 * MS);

        game.poll_gravity(now + 1500 * MS);
        assert_eq!(piece_y(&game), 0);

        game.apply(Action::Resume, now + 1600 * MS);
        game.poll_gravity(now + 2599 * MS);
        assert_eq!(piece_y(&game), 0);
        game.poll_gravity(now + 2600 * MS);
        assert_eq!(piece_y(&game), 1);
    }

    #[test]
    fn test_level_change_recadences_gravity() {
        let now = Instant::now();
        let mut game = LocalGame::new();
        game.apply(Action::Start, now);

        game.state.lines = 10;
        game.state.level = 1;
        game.apply(Action::MoveLeft, now + 100 * MS);

        // Level 1 drops every 950 ms, counted from the reschedule.
        game.poll_gravity(now + 1049 * MS);
        assert_eq!(piece_y(&game), 0);
        game.poll_gravity(now + 1050 * MS);
        assert_eq!(piece_y(&game), 1);
    }

    #[test]
    fn test_fresh_game_is_reported_once() {
        let mut game = LocalGame::new();

        assert!(game.take_update_if_changed().is_some());
        assert!(game.take_update_if_changed().is_none());
    }

    #[test]
    fn test_changes_are_reported_once_each() {
        let now = Instant::now();
        let mut game = LocalGame::new();
        game.take_update_if_changed();

        game.apply(Action::Start, now);
        assert!(game.take_update_if_changed().is_some());
        assert!(game.take_update_if_changed().is_none());

        game.apply(Action::MoveLeft, now);
        let update = game.take_update_if_changed();
        assert_eq!(update.map(|state| state.current.map(|piece| piece.x)), Some(Some(2)));
    }

    #[test]
    fn test_lobby_records_assigned_id() {
        let mut lobby = Lobby::new();
        lobby.apply(&ServerMessage::Connected {
            id: "abc".to_string(),
        });
        assert_eq!(lobby.my_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_roster_replaces_previous_table() {
        let mut lobby = Lobby::new();
        lobby.apply(&roster_of(&["a", "b"]));
        assert_eq!(lobby.participants.len(), 2);

        lobby.apply(&roster_of(&["b"]));
        assert_eq!(lobby.participants.len(), 1);
        assert!(!lobby.participants.contains_key("a"));
    }

    #[test]
    fn test_state_update_overwrites_participant_board() {
        let mut lobby = Lobby::new();
        lobby.apply(&roster_of(&["a"]));

        let mut state = GameState::blank();
        state.score = 1200;
        lobby.apply(&ServerMessage::StateUpdate {
            id: "a".to_string(),
            state,
        });
        assert_eq!(lobby.participants["a"].game.score, 1200);
    }

    #[test]
    fn test_state_update_for_unknown_participant_is_ignored() {
        let mut lobby = Lobby::new();
        lobby.apply(&ServerMessage::StateUpdate {
            id: "ghost".to_string(),
            state: GameState::blank(),
        });
        assert!(lobby.participants.is_empty());
    }

    #[test]
    fn test_remotes_excludes_self_in_stable_order() {
        let mut lobby = Lobby::new();
        lobby.my_id = Some("b".to_string());
        lobby.apply(&roster_of(&["c", "a", "b"]));

        let ids: Vec<&str> = lobby.remotes().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
