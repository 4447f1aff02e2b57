use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::error::{RaceError, Result};

/// Millisecond wall clock
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingReport {
    pub elapsed_secs: f64,
    pub words: usize,
    pub wpm: u32,
}

/// Words are separated by single spaces, so leading, trailing or doubled
/// spaces produce extra empty words and `""` counts as one.
pub fn word_count(typed: &str) -> usize {
    typed.split(' ').count()
}

pub fn elapsed_secs(started_at: u64, now: u64) -> f64 {
    now.saturating_sub(started_at) as f64 / 1000.0
}

pub struct TimingEngine {
    clock: Box<dyn Clock>,
}

impl TimingEngine {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn start(&self) -> u64 {
        self.now()
    }

    pub fn stop(&self, typed: &str, started_at: u64, stopped_at: u64) -> Result<TimingReport> {
        let elapsed_ms = stopped_at as i64 - started_at as i64;
        if elapsed_ms <= 0 {
            return Err(RaceError::ZeroElapsed { elapsed_ms });
        }

        let elapsed_secs = elapsed_ms as f64 / 1000.0;
        let words = word_count(typed);
        let wpm = (words as f64 / elapsed_secs * 60.0).round() as u32;

        Ok(TimingReport {
            elapsed_secs,
            words,
            wpm,
        })
    }
}
