//! Cooperative timers for the race clock.
//!
//! Nothing here sleeps or spawns: the event loop asks [`Scheduler::pop_due`]
//! which timers have fired since the last tick and runs their handlers to
//! completion, one at a time. Cancelling a timer removes it from the table so
//! it can never fire after the transition that stopped it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One second per tick while the countdown runs
    Countdown,
    /// Opponent movement while racing
    Opponents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    period_ms: u64,
    next_due_ms: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    countdown: Option<Interval>,
    opponents: Option<Interval>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Interval> {
        match kind {
            TimerKind::Countdown => &mut self.countdown,
            TimerKind::Opponents => &mut self.opponents,
        }
    }

    /// Arm `kind` to first fire one period after `now_ms`
    pub fn start(&mut self, kind: TimerKind, period_ms: u64, now_ms: u64) {
        let period_ms = period_ms.max(1);
        *self.slot(kind) = Some(Interval {
            period_ms,
            next_due_ms: now_ms.saturating_add(period_ms),
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        *self.slot(kind) = None;
    }

    pub fn cancel_all(&mut self) {
        self.countdown = None;
        self.opponents = None;
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Countdown => self.countdown.is_some(),
            TimerKind::Opponents => self.opponents.is_some(),
        }
    }

    /// Take the timer whose deadline passed first and re-arm it for its next
    /// period. Countdown wins ties.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerKind> {
        let due = |slot: Option<Interval>| {
            slot.filter(|i| i.next_due_ms <= now_ms)
                .map(|i| i.next_due_ms)
        };

        let kind = match (due(self.countdown), due(self.opponents)) {
            (Some(c), Some(o)) if o < c => TimerKind::Opponents,
            (Some(_), _) => TimerKind::Countdown,
            (None, Some(_)) => TimerKind::Opponents,
            (None, None) => return None,
        };

        if let Some(interval) = self.slot(kind) {
            interval.next_due_ms = interval.next_due_ms.saturating_add(interval.period_ms);
        }
        Some(kind)
    }
}
