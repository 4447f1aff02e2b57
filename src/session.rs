use serde::Serialize;

use crate::timing;

pub const LOCAL_PLAYER_ID: &str = "me";
pub const CAR_AVATAR: &str = "🚗";
pub const PLAYER_COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "purple", "orange"];

/// Most opponents a session can seat, one palette color each
pub const MAX_OPPONENTS: usize = PLAYER_COLORS.len() - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Phase {
    NoSession,
    Lobby,
    Countdown,
    Racing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub color: String,
    /// Percentage of the passage covered, 0..=100
    pub progress: f64,
    /// Words per minute, only known once the local player finishes
    pub speed: u32,
    pub accuracy: f64,
}

impl Participant {
    fn new(id: String, name: String, color: &str) -> Self {
        Self {
            id,
            name,
            avatar: CAR_AVATAR.to_string(),
            color: color.to_string(),
            progress: 0.0,
            speed: 0,
            accuracy: 100.0,
        }
    }

    pub fn local(name: &str) -> Self {
        Self::new(LOCAL_PLAYER_ID.to_string(), name.to_string(), PLAYER_COLORS[0])
    }

    /// `n` starts at 1
    pub fn opponent(n: usize) -> Self {
        Self::new(
            format!("opponent-{n}"),
            format!("Opponent {n}"),
            PLAYER_COLORS[n % PLAYER_COLORS.len()],
        )
    }

    pub fn is_local(&self) -> bool {
        self.id == LOCAL_PLAYER_ID
    }

    pub fn has_finished(&self) -> bool {
        self.progress >= 100.0
    }

    /// Back to the starting line
    pub fn clear(&mut self) {
        self.progress = 0.0;
        if self.is_local() {
            self.accuracy = 100.0;
            self.speed = 0;
        }
    }
}

/// Local player first, then `opponents` simulated racers
pub fn lineup(player_name: &str, opponents: usize) -> Vec<Participant> {
    std::iter::once(Participant::local(player_name))
        .chain((1..=opponents).map(Participant::opponent))
        .collect()
}

/// Everything the front end needs to render a race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceSession {
    pub session_id: Option<String>,
    pub participants: Vec<Participant>,
    pub passage: String,
    /// Last full snapshot of the local player's input
    pub typed: String,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub countdown_remaining: u32,
    pub phase: Phase,
}

impl RaceSession {
    pub fn new(passage: String) -> Self {
        Self {
            session_id: None,
            participants: Vec::new(),
            passage,
            typed: String::new(),
            started_at: None,
            finished_at: None,
            countdown_remaining: 0,
            phase: Phase::NoSession,
        }
    }

    pub fn local_player(&self) -> Option<&Participant> {
        self.participants.first().filter(|p| p.is_local())
    }

    pub fn local_player_mut(&mut self) -> Option<&mut Participant> {
        self.participants.first_mut().filter(|p| p.is_local())
    }

    pub fn opponents_mut(&mut self) -> &mut [Participant] {
        self.participants.get_mut(1..).unwrap_or_default()
    }

    /// Only the local player seated first in an open session owns it
    pub fn is_owner(&self, participant_id: &str) -> bool {
        self.session_id.is_some()
            && self
                .local_player()
                .is_some_and(|p| p.id == participant_id)
    }

    pub fn all_finished(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(Participant::has_finished)
    }

    /// Seconds on the race clock: frozen at finish, zero before the start
    pub fn elapsed_secs(&self, now: u64) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => timing::elapsed_secs(start, end),
            (Some(start), None) => timing::elapsed_secs(start, now),
            _ => 0.0,
        }
    }

    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Racing && self.countdown_remaining == 0
    }
}
