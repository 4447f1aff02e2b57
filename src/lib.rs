// Race core, usable headless. The terminal front end lives in main.rs/ui.rs
// and only talks to `controller::SessionController`.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod leaderboard;
pub mod logging;
pub mod opponents;
pub mod passage;
pub mod progress;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod timing;

pub use controller::SessionController;
pub use error::{RaceError, Result};
pub use session::{Participant, Phase, RaceSession, LOCAL_PLAYER_ID};
