//! Scripted players for headless runs
//!
//! Each autopilot reads the current state and produces the input a player
//! would send before the next tick. They are simple greedy strategies, good
//! enough to exercise every game path end to end.

use std::cell::Cell as Slot;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;

use super::balls::{self, BallsInput, BallsState, Projectile};
use super::letters::{FallingInput, FallingState};
use super::shop::Upgrade;
use super::snake::{self, SnakeInput, SnakeState};
use super::{Game, GameKind};
use crate::settings::Settings;
use crate::sim::{Cell, CountingSurface, Direction, EntityId, GamePhase, Session};

/// A game that can play itself
pub trait Autopilot: Game {
    fn autopilot(&self) -> Self::Input;
}

/// Shortest signed offset from `from` to `to` on a wrapping axis of `len` cells
fn wrapped_offset(from: i32, to: i32, len: i32) -> i32 {
    let d = (to - from).rem_euclid(len);
    if d > len / 2 { d - len } else { d }
}

fn snake_blocked(state: &SnakeState, cell: Cell) -> bool {
    state.mines.iter().any(|m| m.square.contains(cell))
        || state.segments.iter().any(|s| s.cell == cell)
}

impl Autopilot for SnakeState {
    /// Head for the food, avoiding cells that would end the run
    fn autopilot(&self) -> SnakeInput {
        let Some(head) = self.head() else {
            return SnakeInput::default();
        };
        let Some(current) = self.direction else {
            return SnakeInput {
                direction: Some(Direction::Up),
            };
        };

        let goal = self.food.map(|f| f.square.origin);
        let dx = goal.map_or(0, |g| wrapped_offset(head.x, g.x, snake::GRID_WIDTH));
        let dy = goal.map_or(0, |g| wrapped_offset(head.y, g.y, snake::GRID_HEIGHT));

        let mut preferred = Vec::with_capacity(5);
        if dx != 0 {
            preferred.push(if dx > 0 { Direction::Right } else { Direction::Left });
        }
        if dy != 0 {
            preferred.push(if dy > 0 { Direction::Down } else { Direction::Up });
        }
        preferred.push(current);
        preferred.extend(Direction::ALL);

        let choice = preferred
            .into_iter()
            .filter(|d| *d != current.opposite())
            .find(|d| {
                let next = head.step_wrapped(*d, snake::GRID_WIDTH, snake::GRID_HEIGHT);
                !snake_blocked(self, next)
            })
            .unwrap_or(current);

        SnakeInput {
            direction: Some(choice),
        }
    }
}

/// Widest aim the solver considers, degrees either side of vertical
const AIM_RANGE: f32 = 75.0;
/// Ticks simulated per candidate shot
const AIM_HORIZON: u32 = 200;

/// Closest a shot at `angle` comes to `goal`, flying through an empty field
fn closest_approach(angle: f32, goal: Vec2) -> f32 {
    let rad = angle.to_radians();
    let mut p = Projectile {
        id: EntityId(0),
        pos: balls::SIGHT_ORIGIN,
        vel: Vec2::new(rad.sin(), -rad.cos()) * balls::PROJECTILE_SPEED,
    };
    let mut best = p.pos.distance(goal);
    for _ in 0..AIM_HORIZON {
        balls::integrate(&mut p);
        balls::bounce_walls(&mut p);
        best = best.min(p.pos.distance(goal));
        if p.pos.y > balls::FIELD_HEIGHT {
            break;
        }
    }
    best
}

/// Best angle on the slow-aim grid for hitting `goal`
pub fn solve_aim(goal: Vec2) -> f32 {
    let steps = (AIM_RANGE / balls::SLOW_AIM_STEP) as i32;
    (-steps..=steps)
        .map(|i| i as f32 * balls::SLOW_AIM_STEP)
        .map(|angle| (angle, closest_approach(angle, goal)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0.0, |(angle, _)| angle)
}

impl Autopilot for BallsState {
    /// One shot at a time at the main target, buying ammo when out
    fn autopilot(&self) -> BallsInput {
        let mut input = BallsInput::default();
        if self.phase != GamePhase::Active || !self.projectiles.is_empty() {
            return input;
        }

        if self.ammo == 0 {
            if self.money >= self.prices.buy_ammo {
                input.purchase = Some(Upgrade::BuyAmmo);
            } else {
                input.fire = true;
            }
            return input;
        }

        let Some(target) = self.target else {
            return input;
        };
        // Slow aim lands the sight exactly on the solver's grid
        let angle = solve_aim(target.bounds.center());
        input.slow_aim = Some(true);
        input.turn = ((angle - self.sight_angle) / balls::SLOW_AIM_STEP).round() as i32;
        input.fire = true;
        input
    }
}

/// Symbols above this line are left alone
const REACTION_LINE: f32 = 250.0;

impl Autopilot for FallingState {
    /// Start, then type the lowest real symbol once it is close to the line
    fn autopilot(&self) -> FallingInput {
        match self.phase {
            GamePhase::Idle => FallingInput {
                start: true,
                keys: Vec::new(),
            },
            GamePhase::GameOver => FallingInput::default(),
            GamePhase::Active => {
                let lowest = self
                    .symbols
                    .iter()
                    .filter(|s| !s.fake && s.pos.y >= REACTION_LINE)
                    .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
                FallingInput {
                    start: false,
                    keys: lowest.map(|s| vec![s.glyph]).unwrap_or_default(),
                }
            }
        }
    }
}

/// Outcome of a headless session
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessRun {
    pub kind: GameKind,
    /// What the completion callback received
    pub score: Option<u64>,
    /// Simulated time until the session ended
    pub game_time: Duration,
    /// Surface operations pushed by the render stage
    pub surface_ops: usize,
    /// Game events logged during the run
    pub events: usize,
    /// Whether the game ended on its own rather than at the time limit
    pub finished: bool,
}

/// Drive a session with the autopilot, one tick per frame, for at most `limit`
///
/// A run still going at the limit is closed, which reports its current score.
pub fn run_headless<G: Autopilot>(game: G, settings: &Settings, limit: Duration) -> HeadlessRun {
    let kind = game.kind();
    let step = game.tick_period();
    let reported = Rc::new(Slot::new(None));
    let sink = Rc::clone(&reported);
    let mut session = Session::new(game, settings, Box::new(move |score| sink.set(Some(score))));
    let mut surface = CountingSurface::default();

    let mut game_time = Duration::ZERO;
    while !session.is_halted() && game_time < limit {
        let input = session.game().autopilot();
        *session.input_mut() = input;
        session.frame(step, &mut surface);
        game_time += step;
    }

    let finished = session.is_halted();
    if !finished {
        session.close();
    }

    HeadlessRun {
        kind,
        score: reported.take().flatten(),
        game_time,
        surface_ops: surface.total(),
        events: session.events_seen(),
        finished,
    }
}
