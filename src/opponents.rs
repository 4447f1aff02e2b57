use rand::Rng;

use crate::session::Participant;

pub const DEFAULT_MAX_STEP: f64 = 5.0;

/// Where opponent progress increments come from
pub trait StepSource: Send {
    /// A value in `[0, max]`
    fn next_step(&mut self, max: f64) -> f64;
}

/// Uniform steps from any random generator
pub struct RandomSteps<R>(pub R);

impl<R: Rng + Send> StepSource for RandomSteps<R> {
    fn next_step(&mut self, max: f64) -> f64 {
        self.0.gen_range(0.0..=max)
    }
}

/// Replays a fixed list of steps, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedSteps {
    steps: Vec<f64>,
    next: usize,
}

impl ScriptedSteps {
    pub fn new(steps: Vec<f64>) -> Self {
        Self { steps, next: 0 }
    }
}

impl StepSource for ScriptedSteps {
    fn next_step(&mut self, max: f64) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let step = self.steps[self.next % self.steps.len()];
        self.next += 1;
        step.clamp(0.0, max)
    }
}

pub struct OpponentSimulator {
    steps: Box<dyn StepSource>,
    max_step: f64,
}

impl OpponentSimulator {
    pub fn new(steps: Box<dyn StepSource>, max_step: f64) -> Self {
        Self {
            steps,
            max_step: max_step.max(0.0),
        }
    }

    /// Move every simulated racer that is still running. The local player is
    /// skipped and nobody moves backwards.
    pub fn tick(&mut self, participants: &mut [Participant]) {
        for p in participants
            .iter_mut()
            .filter(|p| !p.is_local() && p.progress < 100.0)
        {
            let step = self.steps.next_step(self.max_step).max(0.0);
            p.progress = (p.progress + step).min(100.0);
        }
    }
}
