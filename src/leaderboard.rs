use itertools::Itertools;

use crate::session::RaceSession;

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// 1-based
    pub rank: usize,
    pub name: String,
    pub avatar: String,
    pub color: String,
    pub progress: f64,
    pub speed: u32,
    pub accuracy: f64,
    pub finished: bool,
}

/// Furthest along first, then fastest. Equal racers keep their seat order.
pub fn standings(session: &RaceSession) -> Vec<Standing> {
    session
        .participants
        .iter()
        .sorted_by(|a, b| {
            b.progress
                .total_cmp(&a.progress)
                .then_with(|| b.speed.cmp(&a.speed))
        })
        .enumerate()
        .map(|(idx, p)| Standing {
            rank: idx + 1,
            name: p.name.clone(),
            avatar: p.avatar.clone(),
            color: p.color.clone(),
            progress: p.progress,
            speed: p.speed,
            accuracy: p.accuracy,
            finished: p.has_finished(),
        })
        .collect()
}

pub fn format_accuracy(accuracy: f64) -> String {
    format!("{accuracy:.2}%")
}
