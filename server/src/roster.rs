//! Participant bookkeeping for the relay
//!
//! This module owns the server-side record of everyone in the room:
//! - Join and leave lifecycle, keyed by connection id
//! - Verbatim storage of each player's latest self-reported game state
//! - Generated usernames and avatars for players who join without them
//!
//! The roster is plain data owned by the relay loop. It never talks to the
//! network and needs no locking, because only that loop touches it.

use std::collections::HashMap;

use log::info;
use rand::Rng;
use shared::{GameState, Participant, ParticipantId};

const ADJECTIVES: [&str; 8] = [
    "Cool", "Super", "Mega", "Epic", "Fire", "Swift", "Smart", "Bold",
];
const NOUNS: [&str; 8] = [
    "Player", "Gamer", "Hero", "Star", "Ace", "Pro", "Legend", "Master",
];
const AVATARS: [&str; 12] = [
    "😊", "😎", "🤖", "🦄", "🔥", "⚡", "🌟", "🎮", "🎯", "🚀", "💎", "🌈",
];

/// Display name for a player who joined without one, in the form
/// "SwiftHero7".
pub fn random_username() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let number: u32 = rng.gen_range(0..100);
    format!("{}{}{}", adjective, noun, number)
}

/// Avatar glyph for a player who joined without one.
pub fn random_avatar() -> String {
    let mut rng = rand::thread_rng();
    AVATARS[rng.gen_range(0..AVATARS.len())].to_string()
}

/// All joined participants indexed by connection id
///
/// A connection only appears here after its Join message; connections that
/// never join are invisible to other players. The stored game states are
/// whatever the owning client last reported, untouched by the server.
#[derive(Debug, Default)]
pub struct Roster {
    participants: HashMap<ParticipantId, Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
        }
    }

    /// Registers a participant, filling in any identity fields the client
    /// left blank. Joining again under the same id replaces the record.
    pub fn join(
        &mut self,
        id: &ParticipantId,
        username: Option<String>,
        avatar: Option<String>,
    ) -> &Participant {
        let participant = Participant {
            id: id.clone(),
            username: username.unwrap_or_else(random_username),
            avatar: avatar.unwrap_or_else(random_avatar),
            game: GameState::blank(),
            connected: true,
        };
        info!(
            "Participant {} joined as {} {}",
            id, participant.username, participant.avatar
        );
        self.participants.insert(id.clone(), participant);
        &self.participants[id]
    }

    /// Removes a participant. Returns the record so callers can log who
    /// left. Unknown ids return None.
    pub fn leave(&mut self, id: &ParticipantId) -> Option<Participant> {
        let removed = self.participants.remove(id);
        if let Some(participant) = &removed {
            info!("Participant {} ({}) left", id, participant.username);
        }
        removed
    }

    /// Stores a participant's self-reported state verbatim. Reports from
    /// ids that never joined are discarded.
    pub fn update_state(&mut self, id: &ParticipantId, state: GameState) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.game = state;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Full copy of the table for snapshot broadcasts.
    pub fn snapshot(&self) -> HashMap<ParticipantId, Participant> {
        self.participants.clone()
    }
}
