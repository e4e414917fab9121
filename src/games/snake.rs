//! Snake
//!
//! Grid snake on a wrapping 40x40 field. Food comes in four tiers of
//! increasing value and footprint; every ten points plants a mine, and each
//! new mine makes the older ones grow.

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::{Game, GameKind};
use crate::consts::PLACEMENT_ATTEMPTS;
use crate::sim::placement::{clear_of_cells, in_travel_lane};
use crate::sim::{
    Cell, CellSquare, Direction, EntityId, GamePhase, GameRng, IdAllocator, Placement, Sprite,
    SpriteKind, sample, seeded_rng,
};

pub const GRID_WIDTH: i32 = 40;
pub const GRID_HEIGHT: i32 = 40;
/// Cell side in pixels, for sprites
pub const CELL_SIZE: f32 = 15.0;
pub const TICK_MS: u64 = 100;
pub const INITIAL_LENGTH: i32 = 3;
/// A mine is due for every this many points
pub const MINE_SCORE_STEP: u64 = 10;
/// Largest mine side in cells
pub const MAX_MINE_SIZE: i32 = 5;
/// Minimum Chebyshev distance (cells) from a new mine to the snake
pub const SNAKE_CLEARANCE: i32 = 3;
/// Minimum Chebyshev distance (cells) between mines
pub const MINE_CLEARANCE: i32 = 2;
pub const MINE_ATTEMPTS: u32 = 100;

const MINE_MESSAGES: &[&str] = &[
    "Explosive finale!",
    "The mine did not stand on ceremony",
    "A burst of emotion, and the snake is history",
    "And that was that!",
    "Everything was fine a minute ago",
    "Not everything that glitters is safe",
    "The snake got caught in the blast",
    "Lesson learned: go around mines",
];

const SELF_MESSAGES: &[&str] = &[
    "Well, it ate itself!",
    "Dinner, cannibal style",
    "That is how you lose your head... and your tail",
    "Eating yourself is the new trend!",
    "Identity crisis?",
    "Defeated by yourself",
    "You are not you when you are hungry!",
];

/// Food tiers: value, spawn chance and side length grow together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodTier {
    Blue,
    Yellow,
    Red,
    Purple,
}

impl FoodTier {
    pub const ALL: [FoodTier; 4] = [
        FoodTier::Blue,
        FoodTier::Yellow,
        FoodTier::Red,
        FoodTier::Purple,
    ];

    pub fn value(self) -> u32 {
        match self {
            FoodTier::Blue => 1,
            FoodTier::Yellow => 4,
            FoodTier::Red => 9,
            FoodTier::Purple => 16,
        }
    }

    pub fn spawn_chance(self) -> f64 {
        match self {
            FoodTier::Blue => 0.70,
            FoodTier::Yellow => 0.20,
            FoodTier::Red => 0.07,
            FoodTier::Purple => 0.03,
        }
    }

    /// Side length in cells
    pub fn size(self) -> i32 {
        match self {
            FoodTier::Blue => 1,
            FoodTier::Yellow => 2,
            FoodTier::Red => 3,
            FoodTier::Purple => 4,
        }
    }

    /// Pick a tier from a uniform roll in [0, 1)
    pub fn from_roll(roll: f64) -> Self {
        let mut rest = roll;
        for tier in Self::ALL {
            if rest <= tier.spawn_chance() {
                return tier;
            }
            rest -= tier.spawn_chance();
        }
        FoodTier::Blue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub id: EntityId,
    pub cell: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    pub id: EntityId,
    pub tier: FoodTier,
    pub square: CellSquare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mine {
    pub id: EntityId,
    pub square: CellSquare,
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Mine,
    SelfCollision,
}

impl EndReason {
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            EndReason::Mine => MINE_MESSAGES,
            EndReason::SelfCollision => SELF_MESSAGES,
        }
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum SnakeEvent {
    Started(Direction),
    Ate { tier: FoodTier, points: u64 },
    FoodSkipped,
    MinePlaced(EntityId),
    MineSkipped,
    MineGrew { id: EntityId, size: i32 },
    GameOver { reason: EndReason, message: &'static str },
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct SnakeInput {
    /// Last arrow key pressed since the previous tick
    pub direction: Option<Direction>,
}

/// Complete Snake state
#[derive(Debug, Clone)]
pub struct SnakeState {
    rng: GameRng,
    ids: IdAllocator,
    pub phase: GamePhase,
    /// Head first
    pub segments: VecDeque<Segment>,
    pub direction: Option<Direction>,
    /// Direction applied on the next move
    pub next_direction: Option<Direction>,
    pub score: u64,
    pub food: Option<Food>,
    pub mines: Vec<Mine>,
    pub foods_spawned: u32,
    pub end_reason: Option<EndReason>,
    pub end_message: Option<&'static str>,
    pub events: Vec<SnakeEvent>,
}

impl SnakeState {
    /// New game: a three-segment snake facing right and one food
    pub fn new(seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let mut ids = IdAllocator::default();

        let head = Cell::new(
            rng.random_range(INITIAL_LENGTH..=GRID_WIDTH - INITIAL_LENGTH),
            rng.random_range(0..GRID_HEIGHT),
        );
        let segments = (0..INITIAL_LENGTH)
            .map(|i| Segment {
                id: ids.next_id(),
                cell: Cell::new(head.x - i, head.y),
            })
            .collect();

        let mut state = Self {
            rng,
            ids,
            phase: GamePhase::Idle,
            segments,
            direction: None,
            next_direction: None,
            score: 0,
            food: None,
            mines: Vec::new(),
            foods_spawned: 0,
            end_reason: None,
            end_message: None,
            events: Vec::new(),
        };
        state.spawn_food();
        state
    }

    pub fn head(&self) -> Option<Cell> {
        self.segments.front().map(|s| s.cell)
    }

    /// Place a new food item where neither the snake nor a mine is
    pub fn spawn_food(&mut self) -> Placement<EntityId> {
        let segments = &self.segments;
        let mines = &self.mines;
        let placement = sample(
            &mut self.rng,
            PLACEMENT_ATTEMPTS,
            |rng| {
                let tier = FoodTier::from_roll(rng.random::<f64>());
                let size = tier.size();
                let origin = Cell::new(
                    rng.random_range(0..=GRID_WIDTH - size),
                    rng.random_range(0..=GRID_HEIGHT - size),
                );
                (tier, CellSquare::new(origin, size))
            },
            |(_, square)| {
                square
                    .cells()
                    .all(|c| !snake_covers(segments, c) && !mines_cover(mines, c))
            },
        );

        match placement {
            Placement::Placed((tier, square)) => {
                let id = self.ids.next_id();
                self.food = Some(Food { id, tier, square });
                self.foods_spawned += 1;
                Placement::Placed(id)
            }
            Placement::NotPlaced { attempts } => {
                self.food = None;
                self.events.push(SnakeEvent::FoodSkipped);
                Placement::NotPlaced { attempts }
            }
        }
    }

    /// Plant a 1x1 mine away from the snake, its lane, food and other mines,
    /// then grow every older mine by one cell where it still fits
    pub fn add_mine(&mut self) -> Placement<EntityId> {
        let segments = &self.segments;
        let mines = &self.mines;
        let food = self.food.as_ref();
        let direction = self.direction;
        let placement = sample(
            &mut self.rng,
            MINE_ATTEMPTS,
            |rng| Cell::new(rng.random_range(0..GRID_WIDTH), rng.random_range(0..GRID_HEIGHT)),
            |&cell| {
                clear_of_snake(segments, direction, cell)
                    && !mines_cover(mines, cell)
                    && !food.is_some_and(|f| f.square.contains(cell))
                    && mines
                        .iter()
                        .all(|m| m.square.chebyshev_to(cell) >= MINE_CLEARANCE)
            },
        );

        let cell = match placement {
            Placement::Placed(cell) => cell,
            Placement::NotPlaced { attempts } => {
                self.events.push(SnakeEvent::MineSkipped);
                return Placement::NotPlaced { attempts };
            }
        };

        let id = self.ids.next_id();
        self.mines.push(Mine {
            id,
            square: CellSquare::new(cell, 1),
        });
        self.events.push(SnakeEvent::MinePlaced(id));
        log::debug!("Mine {} placed at {:?}", id, cell);

        for idx in 0..self.mines.len() - 1 {
            let size = self.mines[idx].square.size;
            if size < MAX_MINE_SIZE && self.can_grow(idx, size + 1) {
                self.mines[idx].square.size = size + 1;
                self.events.push(SnakeEvent::MineGrew {
                    id: self.mines[idx].id,
                    size: size + 1,
                });
            }
        }

        Placement::Placed(id)
    }

    /// Whether mine `idx` can grow to `new_size` without touching anything
    fn can_grow(&self, idx: usize, new_size: i32) -> bool {
        let current = self.mines[idx].square;
        let grown = CellSquare::new(current.origin, new_size);
        if !grown.fits(GRID_WIDTH, GRID_HEIGHT) {
            return false;
        }

        grown.cells().filter(|c| !current.contains(*c)).all(|c| {
            !snake_covers(&self.segments, c)
                && !self.food.is_some_and(|f| f.square.contains(c))
                && self
                    .mines
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .all(|(_, other)| other.square.chebyshev_to(c) >= MINE_CLEARANCE)
        })
    }

    fn end(&mut self, reason: EndReason) {
        let message = reason
            .messages()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Game over!");
        self.phase = GamePhase::GameOver;
        self.end_reason = Some(reason);
        self.end_message = Some(message);
        self.events.push(SnakeEvent::GameOver { reason, message });
        log::info!("Snake over ({:?}): {} Score: {}", reason, message, self.score);
    }
}

fn snake_covers(segments: &VecDeque<Segment>, cell: Cell) -> bool {
    segments.iter().any(|s| s.cell == cell)
}

fn mines_cover(mines: &[Mine], cell: Cell) -> bool {
    mines.iter().any(|m| m.square.contains(cell))
}

/// Far enough from every segment and outside the lane ahead of the head
fn clear_of_snake(segments: &VecDeque<Segment>, direction: Option<Direction>, cell: Cell) -> bool {
    if !clear_of_cells(cell, segments.iter().map(|s| s.cell), SNAKE_CLEARANCE) {
        return false;
    }
    match (segments.front(), direction) {
        (Some(head), Some(dir)) if segments.len() > 1 => {
            !in_travel_lane(cell, head.cell, dir, SNAKE_CLEARANCE)
        }
        _ => true,
    }
}

/// Advance Snake by one tick
pub fn tick(state: &mut SnakeState, input: &SnakeInput) {
    match state.phase {
        GamePhase::GameOver => return,
        GamePhase::Idle => {
            // The snake faces right; starting to the left would fold it onto itself
            if let Some(dir) = input.direction.filter(|d| *d != Direction::Left) {
                state.phase = GamePhase::Active;
                state.direction = Some(dir);
                state.events.push(SnakeEvent::Started(dir));
                log::info!("Snake started heading {:?}", dir);
            }
            return;
        }
        GamePhase::Active => {}
    }

    if let Some(dir) = input.direction {
        if state.direction != Some(dir.opposite()) {
            state.next_direction = Some(dir);
        }
    }

    advance(state);
}

fn advance(state: &mut SnakeState) {
    if let Some(next) = state.next_direction.take() {
        state.direction = Some(next);
    }
    let (Some(direction), Some(head)) = (state.direction, state.head()) else {
        return;
    };

    let new_head = head.step_wrapped(direction, GRID_WIDTH, GRID_HEIGHT);
    let id = state.ids.next_id();
    state.segments.push_front(Segment { id, cell: new_head });

    if mines_cover(&state.mines, new_head) {
        state.end(EndReason::Mine);
        return;
    }
    if state.segments.iter().skip(1).any(|s| s.cell == new_head) {
        state.end(EndReason::SelfCollision);
        return;
    }

    let eaten = state
        .food
        .filter(|f| f.square.contains(new_head))
        .map(|f| f.tier);

    match eaten {
        Some(tier) => {
            let points = u64::from(tier.value());
            state.score += points;
            state.events.push(SnakeEvent::Ate { tier, points });

            if (state.score / MINE_SCORE_STEP) as usize + 1 > state.mines.len() {
                state.add_mine();
            }

            // Grow by repeating the tail; the copies unfold as the snake moves
            if let Some(tail) = state.segments.back().map(|s| s.cell) {
                for _ in 1..tier.value() {
                    let id = state.ids.next_id();
                    state.segments.push_back(Segment { id, cell: tail });
                }
            }

            state.spawn_food();
        }
        None => {
            state.segments.pop_back();
            if state.food.is_none() {
                state.spawn_food();
            }
        }
    }
}

fn cell_origin(cell: Cell) -> Vec2 {
    Vec2::new(cell.x as f32, cell.y as f32) * CELL_SIZE
}

impl Game for SnakeState {
    type Input = SnakeInput;
    type Event = SnakeEvent;

    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(TICK_MS)
    }

    fn tick(&mut self, input: &SnakeInput) {
        tick(self, input);
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn sprites(&self) -> Vec<Sprite> {
        let mut sprites = Vec::with_capacity(self.segments.len() + self.mines.len() + 1);
        if let Some(food) = &self.food {
            sprites.push(Sprite {
                id: food.id,
                kind: SpriteKind::Food {
                    value: food.tier.value(),
                },
                pos: cell_origin(food.square.origin),
                size: food.square.size as f32 * CELL_SIZE,
            });
        }
        sprites.extend(self.segments.iter().map(|s| Sprite {
            id: s.id,
            kind: SpriteKind::SnakeSegment,
            pos: cell_origin(s.cell),
            size: CELL_SIZE,
        }));
        sprites.extend(self.mines.iter().map(|m| Sprite {
            id: m.id,
            kind: SpriteKind::Mine,
            pos: cell_origin(m.square.origin),
            size: m.square.size as f32 * CELL_SIZE,
        }));
        sprites
    }

    fn drain_events(&mut self) -> Vec<SnakeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segments(cells: &[(i32, i32)]) -> VecDeque<Segment> {
        cells
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Segment {
                id: EntityId(1000 + i as u32),
                cell: Cell::new(x, y),
            })
            .collect()
    }

    fn active(seed: u64, cells: &[(i32, i32)], direction: Direction) -> SnakeState {
        let mut state = SnakeState::new(seed);
        state.segments = segments(cells);
        state.direction = Some(direction);
        state.phase = GamePhase::Active;
        state.food = None;
        state.mines.clear();
        state.events.clear();
        state
    }

    #[test]
    fn test_new_snake_faces_right() {
        let state = SnakeState::new(42);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.segments.len(), 3);
        let head = state.head().unwrap();
        assert_eq!(state.segments[1].cell, Cell::new(head.x - 1, head.y));
        assert!(state.food.is_some());
    }

    #[test]
    fn test_left_does_not_start() {
        let mut state = SnakeState::new(1);
        let before = state.segments.clone();
        tick(&mut state, &SnakeInput { direction: Some(Direction::Left) });
        assert_eq!(state.phase, GamePhase::Idle);

        tick(&mut state, &SnakeInput { direction: Some(Direction::Up) });
        assert_eq!(state.phase, GamePhase::Active);
        assert_eq!(state.direction, Some(Direction::Up));
        // Starting does not move the snake yet
        assert_eq!(state.segments, before);
    }

    #[test]
    fn test_reverse_is_ignored() {
        let mut state = active(5, &[(10, 10), (9, 10), (8, 10)], Direction::Right);
        tick(&mut state, &SnakeInput { direction: Some(Direction::Left) });
        assert_eq!(state.head(), Some(Cell::new(11, 10)));
        assert_eq!(state.direction, Some(Direction::Right));
    }

    #[test]
    fn test_wraps_at_edges() {
        let mut state = active(5, &[(39, 0), (38, 0), (37, 0)], Direction::Right);
        tick(&mut state, &SnakeInput::default());
        assert_eq!(state.head(), Some(Cell::new(0, 0)));
        assert_eq!(state.segments.len(), 3);
    }

    #[test]
    fn test_self_collision_ends_game_with_score_unchanged() {
        let mut state = active(
            9,
            &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)],
            Direction::Down,
        );
        state.score = 7;

        tick(&mut state, &SnakeInput::default());

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.end_reason, Some(EndReason::SelfCollision));
        assert!(SELF_MESSAGES.contains(&state.end_message.unwrap()));
        assert_eq!(state.score, 7);
    }

    #[test]
    fn test_mine_ends_game() {
        let mut state = active(9, &[(10, 10), (9, 10), (8, 10)], Direction::Right);
        state.mines.push(Mine {
            id: EntityId(500),
            square: CellSquare::new(Cell::new(11, 9), 2),
        });
        tick(&mut state, &SnakeInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.end_reason, Some(EndReason::Mine));
        assert!(MINE_MESSAGES.contains(&state.end_message.unwrap()));
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut state = active(9, &[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)], Direction::Down);
        tick(&mut state, &SnakeInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);

        let segments_after = state.segments.clone();
        let events_after = state.events.len();
        for _ in 0..5 {
            tick(&mut state, &SnakeInput { direction: Some(Direction::Right) });
        }
        assert_eq!(state.segments, segments_after);
        assert_eq!(state.events.len(), events_after);
        assert_eq!(
            state
                .events
                .iter()
                .filter(|e| matches!(e, SnakeEvent::GameOver { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_eating_scores_and_grows() {
        let mut state = active(11, &[(10, 10), (9, 10), (8, 10)], Direction::Right);
        state.food = Some(Food {
            id: EntityId(900),
            tier: FoodTier::Yellow,
            square: CellSquare::new(Cell::new(11, 10), 2),
        });

        tick(&mut state, &SnakeInput::default());

        assert_eq!(state.phase, GamePhase::Active);
        assert_eq!(state.score, 4);
        // new head, no tail pop, plus value - 1 tail copies
        assert_eq!(state.segments.len(), 3 + 1 + 3);
        assert!(state.events.contains(&SnakeEvent::Ate {
            tier: FoodTier::Yellow,
            points: 4
        }));
        // First food always calls for a mine
        assert!(state.events.iter().any(|e| matches!(
            e,
            SnakeEvent::MinePlaced(_) | SnakeEvent::MineSkipped
        )));
        // Replacement food does not overlap the snake
        if let Some(food) = state.food {
            assert!(food.square.cells().all(|c| !snake_covers(&state.segments, c)));
        }
    }

    #[test]
    fn test_tier_roll() {
        assert_eq!(FoodTier::from_roll(0.0), FoodTier::Blue);
        assert_eq!(FoodTier::from_roll(0.75), FoodTier::Yellow);
        assert_eq!(FoodTier::from_roll(0.95), FoodTier::Red);
        assert_eq!(FoodTier::from_roll(0.99), FoodTier::Purple);
    }

    #[test]
    fn test_mines_keep_their_distance() {
        for seed in 0..20 {
            let mut state = active(seed, &[(20, 20), (19, 20), (18, 20)], Direction::Right);
            for _ in 0..12 {
                state.add_mine();
            }

            for (i, a) in state.mines.iter().enumerate() {
                assert!(a.square.fits(GRID_WIDTH, GRID_HEIGHT));
                assert!(a.square.size <= MAX_MINE_SIZE);
                assert!(a.square.cells().all(|c| !snake_covers(&state.segments, c)));
                for b in state.mines.iter().skip(i + 1) {
                    let gap = a
                        .square
                        .cells()
                        .map(|c| b.square.chebyshev_to(c))
                        .min()
                        .unwrap();
                    assert!(gap >= MINE_CLEARANCE, "seed {seed}: mines too close");
                }
            }
        }
    }

    #[test]
    fn test_mine_avoids_travel_lane() {
        for seed in 0..20 {
            let mut state = active(seed, &[(20, 20), (19, 20), (18, 20)], Direction::Right);
            if let Placement::Placed(_) = state.add_mine() {
                let mine = state.mines[0].square.origin;
                assert!(!in_travel_lane(mine, Cell::new(20, 20), Direction::Right, SNAKE_CLEARANCE));
                assert!(mine.chebyshev(Cell::new(20, 20)) >= SNAKE_CLEARANCE);
            }
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = SnakeState::new(77);
        let mut b = SnakeState::new(77);
        let inputs = [
            Some(Direction::Up),
            None,
            Some(Direction::Right),
            None,
            Some(Direction::Down),
            None,
        ];
        for dir in inputs {
            let input = SnakeInput { direction: dir };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.segments, b.segments);
        assert_eq!(a.food, b.food);
    }

    proptest! {
        #[test]
        fn prop_food_never_lands_on_snake_or_mines(seed in any::<u64>(), mines in 0usize..8) {
            let mut state = active(
                seed,
                &[(20, 20), (19, 20), (18, 20), (17, 20)],
                Direction::Right,
            );
            for _ in 0..mines {
                state.add_mine();
            }
            for _ in 0..20 {
                if let Placement::Placed(_) = state.spawn_food() {
                    let food = state.food.unwrap();
                    prop_assert!(food.square.fits(GRID_WIDTH, GRID_HEIGHT));
                    for cell in food.square.cells() {
                        prop_assert!(!snake_covers(&state.segments, cell));
                        prop_assert!(!mines_cover(&state.mines, cell));
                    }
                }
            }
        }
    }
}
