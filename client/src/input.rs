//! Keyboard translation into game actions with key-repeat scheduling

use crate::timer::Scheduler;
use macroquad::prelude::*;
use shared::{Action, GameState};
use std::time::{Duration, Instant};

/// Delay before a held key starts repeating.
const INITIAL_DELAY: Duration = Duration::from_millis(200);
/// Cadence of a repeating held key.
const REPEAT_DELAY: Duration = Duration::from_millis(50);

/// Keys the controller tracks for repeat scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameKey {
    Left,
    Right,
    SoftDrop,
}

/// Pressed-state snapshot of the game keys for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyFrame {
    pub left: bool,
    pub right: bool,
    pub soft_drop: bool,
    pub rotate: bool,
    pub hard_drop: bool,
    pub pause: bool,
    pub start: bool,
}

/// Reads the keyboard through macroquad for the current frame.
pub fn sample_keys() -> KeyFrame {
    KeyFrame {
        left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
        right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
        soft_drop: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
        rotate: is_key_down(KeyCode::Space) || is_key_down(KeyCode::Up),
        hard_drop: is_key_down(KeyCode::Tab),
        pause: is_key_down(KeyCode::Escape),
        start: is_key_down(KeyCode::Enter),
    }
}

/// Turns per-frame key snapshots into discrete game actions.
///
/// Rotate, hard drop, pause and start are edge triggered: one action per
/// physical press, no matter how long the key stays down. The steering keys
/// fire once on press, then repeat at a fixed cadence after an initial hold
/// delay. Each key repeats independently, and leaving active play cancels
/// every pending repeat so nothing fires late into a paused or finished game.
pub struct InputController {
    repeats: Scheduler<GameKey>,
    prev: KeyFrame,
}

impl InputController {
    pub fn new() -> Self {
        Self {
            repeats: Scheduler::new(),
            prev: KeyFrame::default(),
        }
    }

    /// Processes one frame of key state and returns the actions it produced.
    pub fn update(&mut self, keys: KeyFrame, now: Instant, state: &GameState) -> Vec<Action> {
        let prev = self.prev;
        self.prev = keys;

        let mut actions = Vec::new();

        // Edge-triggered keys
        if pressed(keys.rotate, prev.rotate) && state.is_active() {
            actions.push(Action::Rotate);
        }
        if pressed(keys.hard_drop, prev.hard_drop) && state.is_active() {
            actions.push(Action::Drop);
        }
        if pressed(keys.pause, prev.pause) {
            if state.paused {
                actions.push(Action::Resume);
            } else if state.playing && !state.game_over {
                actions.push(Action::Pause);
            }
        }
        if pressed(keys.start, prev.start) {
            if !state.playing || state.game_over {
                actions.push(Action::Start);
            } else if state.paused {
                actions.push(Action::Resume);
            }
        }

        if !state.is_active() {
            self.repeats.clear();
            return actions;
        }

        // Level-triggered keys with hold-to-repeat
        self.level_key(GameKey::Left, keys.left, prev.left, Action::MoveLeft, now, &mut actions);
        self.level_key(GameKey::Right, keys.right, prev.right, Action::MoveRight, now, &mut actions);
        self.level_key(
            GameKey::SoftDrop,
            keys.soft_drop,
            prev.soft_drop,
            Action::MoveDown,
            now,
            &mut actions,
        );

        for key in self.repeats.poll(now) {
            let (still_down, action) = match key {
                GameKey::Left => (keys.left, Action::MoveLeft),
                GameKey::Right => (keys.right, Action::MoveRight),
                GameKey::SoftDrop => (keys.soft_drop, Action::MoveDown),
            };
            if still_down {
                actions.push(action);
            }
        }

        actions
    }

    fn level_key(
        &mut self,
        key: GameKey,
        down: bool,
        was_down: bool,
        action: Action,
        now: Instant,
        actions: &mut Vec<Action>,
    ) {
        if pressed(down, was_down) {
            actions.push(action);
            self.repeats.schedule_repeating(key, now, INITIAL_DELAY, REPEAT_DELAY);
        } else if !down && was_down {
            self.repeats.cancel(key);
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

fn pressed(current: bool, previous: bool) -> bool {
    current && !previous
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn active_state() -> GameState {
        let mut state = GameState::new();
        state.apply(Action::Start);
        state
    }

    fn left() -> KeyFrame {
        KeyFrame {
            left: true,
            ..KeyFrame::default()
        }
    }

    fn left_and_right() -> KeyFrame {
        KeyFrame {
            left: true,
            right: true,
            ..KeyFrame::default()
        }
    }

    #[test]
    fn test_steering_press_fires_immediately() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();

        assert_eq!(controller.update(left(), now, &state), vec![Action::MoveLeft]);
        assert!(controller.update(left(), now + 10 * MS, &state).is_empty());
    }

    #[test]
    fn test_held_key_repeats_after_initial_delay() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();

        controller.update(left(), now, &state);
        assert!(controller.update(left(), now + 199 * MS, &state).is_empty());
        assert_eq!(
            controller.update(left(), now + 200 * MS, &state),
            vec![Action::MoveLeft]
        );
        assert_eq!(
            controller.update(left(), now + 250 * MS, &state),
            vec![Action::MoveLeft]
        );
    }

    #[test]
    fn test_release_cancels_repeat() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();

        controller.update(left(), now, &state);
        controller.update(KeyFrame::default(), now + 100 * MS, &state);
        assert!(controller.update(KeyFrame::default(), now + 300 * MS, &state).is_empty());
    }

    #[test]
    fn test_keys_repeat_independently() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();

        assert_eq!(controller.update(left(), now, &state), vec![Action::MoveLeft]);
        assert_eq!(
            controller.update(left_and_right(), now + 100 * MS, &state),
            vec![Action::MoveRight]
        );
        // Left repeats at 200 ms; right's initial delay ends at 300 ms.
        assert_eq!(
            controller.update(left_and_right(), now + 200 * MS, &state),
            vec![Action::MoveLeft]
        );
        assert_eq!(
            controller.update(left_and_right(), now + 300 * MS, &state),
            vec![Action::MoveLeft, Action::MoveLeft, Action::MoveRight]
        );
    }

    #[test]
    fn test_rotate_fires_once_per_press() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();
        let rotate = KeyFrame {
            rotate: true,
            ..KeyFrame::default()
        };

        assert_eq!(controller.update(rotate, now, &state), vec![Action::Rotate]);
        assert!(controller.update(rotate, now + 300 * MS, &state).is_empty());
        controller.update(KeyFrame::default(), now + 310 * MS, &state);
        assert_eq!(
            controller.update(rotate, now + 320 * MS, &state),
            vec![Action::Rotate]
        );
    }

    #[test]
    fn test_hard_drop_is_edge_triggered() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();
        let tab = KeyFrame {
            hard_drop: true,
            ..KeyFrame::default()
        };

        assert_eq!(controller.update(tab, now, &state), vec![Action::Drop]);
        assert!(controller.update(tab, now + 500 * MS, &state).is_empty());
    }

    #[test]
    fn test_escape_pauses_then_resumes() {
        let now = Instant::now();
        let mut state = active_state();
        let mut controller = InputController::new();
        let escape = KeyFrame {
            pause: true,
            ..KeyFrame::default()
        };

        assert_eq!(controller.update(escape, now, &state), vec![Action::Pause]);
        state.apply(Action::Pause);

        controller.update(KeyFrame::default(), now + 10 * MS, &state);
        assert_eq!(
            controller.update(escape, now + 20 * MS, &state),
            vec![Action::Resume]
        );
    }

    #[test]
    fn test_enter_starts_when_idle() {
        let now = Instant::now();
        let state = GameState::new();
        let mut controller = InputController::new();
        let enter = KeyFrame {
            start: true,
            ..KeyFrame::default()
        };

        assert_eq!(controller.update(enter, now, &state), vec![Action::Start]);
    }

    #[test]
    fn test_enter_resumes_when_paused() {
        let now = Instant::now();
        let mut state = active_state();
        state.apply(Action::Pause);
        let mut controller = InputController::new();
        let enter = KeyFrame {
            start: true,
            ..KeyFrame::default()
        };

        assert_eq!(controller.update(enter, now, &state), vec![Action::Resume]);
    }

    #[test]
    fn test_enter_ignored_mid_play() {
        let now = Instant::now();
        let state = active_state();
        let mut controller = InputController::new();
        let enter = KeyFrame {
            start: true,
            ..KeyFrame::default()
        };

        assert!(controller.update(enter, now, &state).is_empty());
    }

    #[test]
    fn test_steering_ignored_when_idle() {
        let now = Instant::now();
        let state = GameState::new();
        let mut controller = InputController::new();

        assert!(controller.update(left(), now, &state).is_empty());
        assert!(controller.update(left(), now + 300 * MS, &state).is_empty());
    }

    #[test]
    fn test_pause_clears_pending_repeats() {
        let now = Instant::now();
        let mut state = active_state();
        let mut controller = InputController::new();

        controller.update(left(), now, &state);
        state.apply(Action::Pause);
        assert!(controller.update(left(), now + 50 * MS, &state).is_empty());

        // Resuming does not revive the old schedule; the key must be
        // pressed again.
        state.apply(Action::Resume);
        assert!(controller.update(left(), now + 300 * MS, &state).is_empty());
        controller.update(KeyFrame::default(), now + 310 * MS, &state);
        assert_eq!(
            controller.update(left(), now + 320 * MS, &state),
            vec![Action::MoveLeft]
        );
    }
}
