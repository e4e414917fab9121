//! Fixed timestep scheduling and game sessions
//!
//! A [`FixedStep`] turns wall-clock frame time into a whole number of
//! simulation ticks. A [`Session`] owns one game and runs each frame in two
//! stages: simulation ticks, then render sync. It reports the final score
//! to its completion callback exactly once.

use std::time::Duration;

use super::GamePhase;
use super::surface::{SceneSync, Surface};
use crate::games::Game;
use crate::settings::Settings;

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_substeps: u32,
}

impl FixedStep {
    pub fn new(step: Duration, max_substeps: u32) -> Self {
        Self {
            step: step.max(Duration::from_millis(1)),
            accumulator: Duration::ZERO,
            max_substeps: max_substeps.max(1),
        }
    }

    #[inline]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add elapsed frame time; returns how many ticks to run now
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_substeps {
            self.accumulator -= self.step;
            ticks += 1;
        }

        // Drop whole steps we could not afford; keep the sub-step remainder
        if self.accumulator >= self.step {
            log::debug!(
                "Frame backlog of {:?} exceeds {} substeps, dropping it",
                self.accumulator,
                self.max_substeps
            );
            let rem = self.accumulator.as_nanos() % self.step.as_nanos();
            self.accumulator = Duration::from_nanos(rem as u64);
        }

        ticks
    }
}

/// Callback receiving the final score when a session ends
pub type Completion = Box<dyn FnOnce(Option<u64>)>;

/// Result of running one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finished,
}

/// One running game plus its timer and render sync
pub struct Session<G: Game> {
    game: G,
    clock: FixedStep,
    input: G::Input,
    scene: SceneSync,
    completion: Option<Completion>,
    game_over_delay: Duration,
    game_over_for: Duration,
    events_seen: usize,
    halted: bool,
}

impl<G: Game> Session<G> {
    pub fn new(game: G, settings: &Settings, completion: Completion) -> Self {
        let clock = FixedStep::new(game.tick_period(), settings.max_substeps);
        log::info!(
            "{} session started (tick {:?})",
            game.kind().display_name(),
            clock.step()
        );
        Self {
            game,
            clock,
            input: G::Input::default(),
            scene: SceneSync::new(),
            completion: Some(completion),
            game_over_delay: settings.game_over_delay(),
            game_over_for: Duration::ZERO,
            events_seen: 0,
            halted: false,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    /// Pending input for the next tick; cleared once a tick consumes it
    pub fn input_mut(&mut self) -> &mut G::Input {
        &mut self.input
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Game events drained so far
    pub fn events_seen(&self) -> usize {
        self.events_seen
    }

    /// Run the ticks due for `elapsed`, then push the scene to `surface`
    pub fn frame(&mut self, elapsed: Duration, surface: &mut dyn Surface) -> SessionStatus {
        if self.halted {
            return SessionStatus::Finished;
        }

        // Simulation stage
        let ticks = self.clock.advance(elapsed);
        for _ in 0..ticks {
            // The delay starts after the tick that ended the game
            if self.game.phase() == GamePhase::GameOver {
                self.game_over_for += self.clock.step();
            }
            let input = std::mem::take(&mut self.input);
            self.game.tick(&input);
            for event in self.game.drain_events() {
                log::debug!("{}: {:?}", self.game.kind(), event);
                self.events_seen += 1;
            }
        }

        // Render stage
        let sprites = self.game.sprites();
        self.scene.sync(&sprites, surface);

        if self.game.phase() == GamePhase::GameOver && self.game_over_for >= self.game_over_delay {
            let score = self.game.score();
            self.finish(Some(score));
            return SessionStatus::Finished;
        }

        SessionStatus::Running
    }

    /// Stop the timer chain and report the score
    ///
    /// A session closed before the game ever started reports no score.
    pub fn close(&mut self) {
        let score = match self.game.phase() {
            GamePhase::Idle => None,
            _ => Some(self.game.score()),
        };
        self.finish(score);
    }

    fn finish(&mut self, score: Option<u64>) {
        self.halted = true;
        if let Some(completion) = self.completion.take() {
            log::info!(
                "{} session finished with score {:?}",
                self.game.kind().display_name(),
                score
            );
            completion(score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::letters::FallingState;
    use crate::games::snake::{Segment, SnakeInput, SnakeState};
    use crate::sim::EntityId;
    use crate::sim::geometry::{Cell, Direction};
    use crate::sim::surface::RecordingSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fixed_step_accumulates() {
        let mut clock = FixedStep::new(Duration::from_millis(20), 8);
        assert_eq!(clock.advance(Duration::from_millis(15)), 0);
        assert_eq!(clock.advance(Duration::from_millis(15)), 1);
        assert_eq!(clock.advance(Duration::from_millis(30)), 2);
    }

    #[test]
    fn test_fixed_step_caps_substeps() {
        let mut clock = FixedStep::new(Duration::from_millis(10), 4);
        assert_eq!(clock.advance(Duration::from_millis(1005)), 4);
        // Backlog dropped, only the 5ms remainder survives
        assert_eq!(clock.advance(Duration::from_millis(5)), 1);
    }

    fn recorder() -> (Rc<RefCell<Vec<Option<u64>>>>, Completion) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        (calls, Box::new(move |score| sink.borrow_mut().push(score)))
    }

    #[test]
    fn test_close_before_start_reports_none() {
        let (calls, completion) = recorder();
        let mut session = Session::new(SnakeState::new(1), &Settings::default(), completion);
        session.close();
        session.close();
        assert_eq!(*calls.borrow(), vec![None]);
        assert!(session.is_halted());
    }

    #[test]
    fn test_close_reports_score_once() {
        let (calls, completion) = recorder();
        let mut session = Session::new(SnakeState::new(1), &Settings::default(), completion);
        let mut surface = RecordingSurface::default();

        *session.input_mut() = SnakeInput {
            direction: Some(Direction::Up),
        };
        session.frame(Duration::from_millis(100), &mut surface);
        assert_eq!(session.game().phase, GamePhase::Active);
        assert!(!surface.ops.is_empty());

        session.close();
        assert_eq!(
            session.frame(Duration::from_millis(100), &mut surface),
            SessionStatus::Finished
        );
        session.close();
        assert_eq!(*calls.borrow(), vec![Some(0)]);
    }

    #[test]
    fn test_game_over_fires_after_delay() {
        let (calls, completion) = recorder();
        let settings = Settings {
            game_over_delay_ms: 300,
            ..Settings::default()
        };
        let mut state = SnakeState::new(3);
        state.phase = GamePhase::GameOver;
        let mut session = Session::new(state, &settings, completion);
        let mut surface = RecordingSurface::default();

        assert_eq!(
            session.frame(Duration::from_millis(200), &mut surface),
            SessionStatus::Running
        );
        assert!(calls.borrow().is_empty());
        assert_eq!(
            session.frame(Duration::from_millis(100), &mut surface),
            SessionStatus::Finished
        );
        assert_eq!(*calls.borrow(), vec![Some(0)]);
    }

    #[test]
    fn test_delay_counts_from_the_fatal_tick() {
        let (calls, completion) = recorder();
        let settings = Settings {
            game_over_delay_ms: 300,
            ..Settings::default()
        };
        // Heading down into its own body
        let mut state = SnakeState::new(9);
        state.segments = [(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)]
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| Segment {
                id: EntityId(1000 + i as u32),
                cell: Cell::new(x, y),
            })
            .collect();
        state.direction = Some(Direction::Down);
        state.phase = GamePhase::Active;
        state.food = None;
        state.mines.clear();
        let mut session = Session::new(state, &settings, completion);
        let mut surface = RecordingSurface::default();

        session.frame(Duration::from_millis(100), &mut surface);
        assert_eq!(session.game().phase, GamePhase::GameOver);

        for _ in 0..2 {
            assert_eq!(
                session.frame(Duration::from_millis(100), &mut surface),
                SessionStatus::Running
            );
        }
        assert!(calls.borrow().is_empty());
        assert_eq!(
            session.frame(Duration::from_millis(100), &mut surface),
            SessionStatus::Finished
        );
        assert_eq!(*calls.borrow(), vec![Some(0)]);
    }

    #[test]
    fn test_events_are_drained_every_tick() {
        let (_calls, completion) = recorder();
        let mut state = FallingState::letters(2);
        state.phase = GamePhase::Active;
        state.spawn_timer_ms = 1.0e9;
        let mut session = Session::new(state, &Settings::default(), completion);
        let mut surface = RecordingSurface::default();

        for _ in 0..10_000 {
            session.input_mut().keys = vec!['Z'];
            session.frame(Duration::from_millis(16), &mut surface);
            assert!(session.game().events.len() <= 1);
        }
        assert!(session.game().events.is_empty());
        assert_eq!(session.events_seen(), 10_000);
    }
}
