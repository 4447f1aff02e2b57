//! The race state machine.
//!
//! ```text
//! NoSession --create/join--> Lobby --start (owner)--> Countdown --0--> Racing --> Finished
//!                              ^                                                    |
//!                              +------------------------- reset --------------------+
//! ```
//!
//! The controller owns the single [`RaceSession`] value. Every command, timer
//! tick and keystroke snapshot runs to completion against it before the next
//! one is handled, so no locking is involved.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RaceConfig;
use crate::error::Result;
use crate::opponents::{OpponentSimulator, RandomSteps, StepSource};
use crate::passage::{Corpus, PassageSource, RandomPassages};
use crate::progress;
use crate::scheduler::{Scheduler, TimerKind};
use crate::session::{lineup, Phase, RaceSession};
use crate::timing::{Clock, SystemClock, TimingEngine};

const COUNTDOWN_TICK_MS: u64 = 1_000;

pub struct SessionController {
    config: RaceConfig,
    session: RaceSession,
    passages: Box<dyn PassageSource>,
    opponents: OpponentSimulator,
    timing: TimingEngine,
    scheduler: Scheduler,
}

impl SessionController {
    pub fn new(
        config: RaceConfig,
        mut passages: Box<dyn PassageSource>,
        steps: Box<dyn StepSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let config = config.sanitized();
        let session = RaceSession::new(passages.next());
        Self {
            opponents: OpponentSimulator::new(steps, config.max_opponent_step),
            config,
            session,
            passages,
            timing: TimingEngine::new(clock),
            scheduler: Scheduler::new(),
        }
    }

    /// Bundled corpus, entropy-seeded randomness and the wall clock
    pub fn from_config(config: RaceConfig) -> Result<Self> {
        let corpus = Corpus::bundled(&config.corpus)?;
        let passages = RandomPassages::new(corpus, StdRng::from_entropy());
        Ok(Self::new(
            config,
            Box::new(passages),
            Box::new(RandomSteps(StdRng::from_entropy())),
            Box::new(SystemClock),
        ))
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn current_state(&self) -> &RaceSession {
        &self.session
    }

    pub fn now(&self) -> u64 {
        self.timing.now()
    }

    pub fn is_timer_running(&self, kind: TimerKind) -> bool {
        self.scheduler.is_running(kind)
    }

    pub fn create_session(&mut self) -> &RaceSession {
        let id = Uuid::new_v4().to_string();
        info!(session_id = %id, "session created");
        self.open_lobby(id);
        &self.session
    }

    /// Any token is accepted, there is no registry to check it against
    pub fn join_session(&mut self, id: &str) -> &RaceSession {
        info!(session_id = %id, "session joined");
        self.open_lobby(id.to_string());
        &self.session
    }

    fn open_lobby(&mut self, id: String) {
        self.scheduler.cancel_all();
        let s = &mut self.session;
        s.session_id = Some(id);
        s.participants = lineup(&self.config.player_name, self.config.opponent_count);
        s.typed.clear();
        s.started_at = None;
        s.finished_at = None;
        s.countdown_remaining = 0;
        s.phase = Phase::Lobby;
    }

    /// Begin the countdown. Only the session owner may do this, from the
    /// lobby; anything else leaves the session untouched and returns `false`.
    pub fn start_session(&mut self, caller: &str) -> bool {
        if self.session.phase != Phase::Lobby || !self.session.is_owner(caller) {
            debug!(caller, phase = %self.session.phase, "start ignored");
            return false;
        }

        self.session.countdown_remaining = self.config.countdown_secs;
        self.session.phase = Phase::Countdown;
        info!(secs = self.config.countdown_secs, "countdown started");

        if self.session.countdown_remaining == 0 {
            self.begin_race();
        } else {
            let now = self.timing.now();
            self.scheduler.start(TimerKind::Countdown, COUNTDOWN_TICK_MS, now);
        }
        true
    }

    /// One second of countdown
    pub fn countdown_tick(&mut self) -> &RaceSession {
        if self.session.phase != Phase::Countdown {
            return &self.session;
        }

        self.session.countdown_remaining = self.session.countdown_remaining.saturating_sub(1);
        debug!(remaining = self.session.countdown_remaining, "countdown");
        if self.session.countdown_remaining == 0 {
            self.begin_race();
        }
        &self.session
    }

    fn begin_race(&mut self) {
        self.scheduler.cancel(TimerKind::Countdown);
        let now = self.timing.start();
        self.session.phase = Phase::Racing;
        if self.session.started_at.is_none() {
            self.session.started_at = Some(now);
        }
        self.scheduler.start(TimerKind::Opponents, self.config.opponent_tick_ms, now);
        info!(started_at = now, "race started");
    }

    /// Move the simulated opponents one step
    pub fn opponent_tick(&mut self) -> &RaceSession {
        if self.session.phase != Phase::Racing {
            return &self.session;
        }

        self.opponents.tick(self.session.opponents_mut());
        if self.session.all_finished() {
            debug!("every participant reached the finish line");
            self.finish();
        }
        &self.session
    }

    /// Replace the local player's input with `typed`, the full text so far
    pub fn submit_keystroke_state(&mut self, typed: &str) -> &RaceSession {
        if !self.session.accepts_input() {
            debug!(phase = %self.session.phase, "input ignored");
            return &self.session;
        }

        // racing states built without the countdown start on the first keystroke
        if self.session.started_at.is_none() {
            self.session.started_at = Some(self.timing.start());
        }

        let update = progress::update(&self.session.passage, typed);
        self.session.typed = typed.to_string();
        if let Some(me) = self.session.local_player_mut() {
            me.accuracy = update.accuracy;
            me.progress = update.progress;
        }

        if update.is_complete || self.session.all_finished() {
            self.finish();
        }
        &self.session
    }

    fn finish(&mut self) {
        self.scheduler.cancel(TimerKind::Opponents);
        let now = self.timing.now();
        let finished_at = *self.session.finished_at.get_or_insert(now);
        self.session.phase = Phase::Finished;

        let speed = match self.session.started_at {
            Some(started_at) => {
                match self.timing.stop(&self.session.typed, started_at, finished_at) {
                    Ok(report) => report.wpm,
                    Err(err) => {
                        warn!(%err, "no speed for this race");
                        0
                    }
                }
            }
            None => 0,
        };
        if let Some(me) = self.session.local_player_mut() {
            me.speed = speed;
        }

        info!(wpm = speed, finished_at, "race finished");
        if let Ok(snapshot) = serde_json::to_string(&self.session) {
            debug!(%snapshot, "final standings");
        }
    }

    /// New passage, everyone back to the start line, same session id
    pub fn reset_session(&mut self) -> &RaceSession {
        self.scheduler.cancel_all();
        let s = &mut self.session;
        s.passage = self.passages.next();
        s.typed.clear();
        s.started_at = None;
        s.finished_at = None;
        s.countdown_remaining = 0;
        for p in s.participants.iter_mut() {
            p.clear();
        }
        s.phase = if s.session_id.is_some() {
            Phase::Lobby
        } else {
            Phase::NoSession
        };
        info!(phase = %s.phase, "session reset");
        &self.session
    }

    /// Run every timer that came due since the last call
    pub fn pump(&mut self) -> &RaceSession {
        let now = self.timing.now();
        while let Some(kind) = self.scheduler.pop_due(now) {
            match kind {
                TimerKind::Countdown => self.countdown_tick(),
                TimerKind::Opponents => self.opponent_tick(),
            };
        }
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opponents::ScriptedSteps;
    use crate::passage::FixedPassage;
    use crate::session::LOCAL_PLAYER_ID;
    use crate::timing::ManualClock;

    fn controller(passage: &str, steps: Vec<f64>) -> (SessionController, ManualClock) {
        let clock = ManualClock::new(1_000);
        let ctl = SessionController::new(
            RaceConfig::default(),
            Box::new(FixedPassage(passage.to_string())),
            Box::new(ScriptedSteps::new(steps)),
            Box::new(clock.clone()),
        );
        (ctl, clock)
    }

    fn racing(passage: &str, steps: Vec<f64>) -> (SessionController, ManualClock) {
        let (mut ctl, clock) = controller(passage, steps);
        ctl.create_session();
        assert!(ctl.start_session(LOCAL_PLAYER_ID));
        for _ in 0..10 {
            ctl.countdown_tick();
        }
        assert_eq!(ctl.current_state().phase, Phase::Racing);
        (ctl, clock)
    }

    #[test]
    fn starts_without_a_session() {
        let (ctl, _) = controller("ab", vec![]);
        let s = ctl.current_state();
        assert_eq!(s.phase, Phase::NoSession);
        assert_eq!(s.session_id, None);
        assert!(s.participants.is_empty());
        assert_eq!(s.passage, "ab");
    }

    #[test]
    fn join_uses_the_given_token() {
        let (mut ctl, _) = controller("ab", vec![]);
        let s = ctl.join_session("not-a-real-session");
        assert_eq!(s.session_id.as_deref(), Some("not-a-real-session"));
        assert_eq!(s.participants.len(), 3);
        assert_eq!(s.phase, Phase::Lobby);
    }

    #[test]
    fn start_outside_lobby_is_ignored() {
        let (mut ctl, _) = controller("ab", vec![]);
        assert!(!ctl.start_session(LOCAL_PLAYER_ID));
        assert_eq!(ctl.current_state().phase, Phase::NoSession);

        ctl.create_session();
        assert!(ctl.start_session(LOCAL_PLAYER_ID));
        let before = ctl.current_state().clone();
        assert!(!ctl.start_session(LOCAL_PLAYER_ID));
        assert_eq!(ctl.current_state(), &before);
    }

    #[test]
    fn input_before_the_race_is_ignored() {
        let (mut ctl, _) = controller("ab", vec![]);
        ctl.create_session();
        let lobby = ctl.current_state().clone();
        assert_eq!(ctl.submit_keystroke_state("a"), &lobby);

        ctl.start_session(LOCAL_PLAYER_ID);
        let counting = ctl.current_state().clone();
        assert_eq!(ctl.submit_keystroke_state("a"), &counting);
        assert_eq!(ctl.current_state().started_at, None);
    }

    #[test]
    fn countdown_hands_over_to_the_opponent_timer() {
        let (mut ctl, _) = controller("ab", vec![]);
        ctl.create_session();
        ctl.start_session(LOCAL_PLAYER_ID);
        assert!(ctl.is_timer_running(TimerKind::Countdown));
        assert!(!ctl.is_timer_running(TimerKind::Opponents));

        for _ in 0..10 {
            ctl.countdown_tick();
        }
        assert!(!ctl.is_timer_running(TimerKind::Countdown));
        assert!(ctl.is_timer_running(TimerKind::Opponents));
    }

    #[test]
    fn zero_second_countdown_starts_immediately() {
        let clock = ManualClock::new(0);
        let mut ctl = SessionController::new(
            RaceConfig {
                countdown_secs: 0,
                ..RaceConfig::default()
            },
            Box::new(FixedPassage("ab".into())),
            Box::new(ScriptedSteps::new(vec![])),
            Box::new(clock),
        );
        ctl.create_session();
        assert!(ctl.start_session(LOCAL_PLAYER_ID));
        assert_eq!(ctl.current_state().phase, Phase::Racing);
        assert!(!ctl.is_timer_running(TimerKind::Countdown));
    }

    #[test]
    fn opponents_only_move_while_racing() {
        let (mut ctl, _) = controller("ab", vec![5.0]);
        ctl.create_session();
        ctl.opponent_tick();
        assert!(ctl.current_state().participants.iter().all(|p| p.progress == 0.0));

        let (mut ctl, _) = racing("ab", vec![5.0]);
        ctl.opponent_tick();
        let s = ctl.current_state();
        assert_eq!(s.participants[0].progress, 0.0);
        assert_eq!(s.participants[1].progress, 5.0);
        assert_eq!(s.participants[2].progress, 5.0);
    }

    #[test]
    fn race_ends_when_everyone_crosses_the_line() {
        // steps are capped at the default 5.0, so opponents need 20 ticks
        let (mut ctl, clock) = racing("abcd", vec![50.0]);

        // over-typing puts the local player at 100% without completing
        clock.advance(2_000);
        ctl.submit_keystroke_state("abxyz");
        assert_eq!(ctl.current_state().phase, Phase::Racing);

        for _ in 0..19 {
            ctl.opponent_tick();
        }
        assert_eq!(ctl.current_state().phase, Phase::Racing);
        ctl.opponent_tick();

        let s = ctl.current_state();
        assert_eq!(s.phase, Phase::Finished);
        assert_eq!(s.finished_at, Some(3_000));
        assert!(!ctl.is_timer_running(TimerKind::Opponents));
        // 1 word in 2 seconds
        assert_eq!(s.participants[0].speed, 30);
    }

    #[test]
    fn finishing_stops_everything() {
        let (mut ctl, clock) = racing("ab", vec![5.0]);
        clock.advance(1_000);
        ctl.submit_keystroke_state("ab");
        let finished = ctl.current_state().clone();
        assert_eq!(finished.phase, Phase::Finished);

        clock.advance(5_000);
        ctl.opponent_tick();
        ctl.submit_keystroke_state("abc");
        ctl.pump();
        assert_eq!(ctl.current_state(), &finished);
    }

    #[test]
    fn instant_finish_has_zero_speed() {
        let (mut ctl, _) = racing("ab", vec![]);
        ctl.submit_keystroke_state("ab");

        let s = ctl.current_state();
        assert_eq!(s.phase, Phase::Finished);
        assert_eq!(s.started_at, s.finished_at);
        assert_eq!(s.participants[0].speed, 0);
    }

    #[test]
    fn first_keystroke_starts_a_clockless_race() {
        let (mut ctl, clock) = controller("hi", vec![]);
        ctl.create_session();
        ctl.session.phase = Phase::Racing;

        clock.advance(500);
        assert_eq!(ctl.submit_keystroke_state("h").started_at, Some(1_500));

        clock.advance(1_000);
        let s = ctl.submit_keystroke_state("hi");
        assert_eq!(s.phase, Phase::Finished);
        assert_eq!(s.started_at, Some(1_500));
        assert_eq!(s.finished_at, Some(2_500));
        // 1 word in 1 second
        assert_eq!(s.participants[0].speed, 60);
    }

    #[test]
    fn pump_drives_countdown_and_opponents() {
        let (mut ctl, clock) = controller("The quick brown fox", vec![2.0]);
        ctl.create_session();
        ctl.start_session(LOCAL_PLAYER_ID);

        clock.advance(9_999);
        ctl.pump();
        assert_eq!(ctl.current_state().phase, Phase::Countdown);
        assert_eq!(ctl.current_state().countdown_remaining, 1);

        clock.advance(1);
        ctl.pump();
        assert_eq!(ctl.current_state().phase, Phase::Racing);
        assert_eq!(ctl.current_state().started_at, Some(11_000));

        clock.advance(1_500);
        ctl.pump();
        // three opponent ticks of 2.0 each
        assert_eq!(ctl.current_state().participants[1].progress, 6.0);
    }

    #[test]
    fn reset_before_any_session_stays_without_one() {
        let (mut ctl, _) = controller("ab", vec![]);
        let s = ctl.reset_session();
        assert_eq!(s.phase, Phase::NoSession);
        assert!(s.participants.is_empty());
    }

    #[test]
    fn reset_mid_race_cancels_timers() {
        let (mut ctl, _) = racing("ab", vec![1.0]);
        ctl.opponent_tick();
        ctl.reset_session();

        assert!(!ctl.is_timer_running(TimerKind::Countdown));
        assert!(!ctl.is_timer_running(TimerKind::Opponents));
        let s = ctl.current_state();
        assert_eq!(s.phase, Phase::Lobby);
        assert!(s.participants.iter().all(|p| p.progress == 0.0));

        // and the owner can go again
        assert!(ctl.start_session(LOCAL_PLAYER_ID));
    }
}
