//! Balls
//!
//! A gravity-ball shooter on an 800x600 field. Projectiles leave the sight,
//! fall under gravity, lose speed to drag, and bounce off the walls and the
//! square obstacles. Hitting the main target advances the level and pays out
//! money; hitting the bonus target refills ammo. Money buys upgrades in the
//! [`shop`](super::shop).

use std::time::Duration;

use glam::Vec2;
use rand::Rng;

use super::shop::{PriceList, ShopError, Upgrade, Upgrades};
use super::{Game, GameKind};
use crate::consts::PLACEMENT_ATTEMPTS;
use crate::sim::geometry::{Edge, crossed_edges};
use crate::sim::placement::clear_of_circles;
use crate::sim::{
    Circle, EntityId, GamePhase, GameRng, IdAllocator, Placement, Rect, Sprite, SpriteKind,
    circle_rect_overlap, circles_overlap, rect_contains_point, sample, seeded_rng,
};

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
/// Wall thickness on the left, right and top
pub const BORDER: f32 = 10.0;
pub const TICK_MS: u64 = 20;

pub const PROJECTILE_RADIUS: f32 = 5.0;
pub const PROJECTILE_SPEED: f32 = 20.0;
pub const SIGHT_ORIGIN: Vec2 = Vec2::new(400.0, 550.0);
pub const SIGHT_LENGTH: f32 = 200.0;
/// Degrees per key press
pub const AIM_STEP: f32 = 3.0;
pub const SLOW_AIM_STEP: f32 = 0.5;

pub const GRAVITY: f32 = 0.1;
pub const DRAG: f32 = 0.005;
pub const RESTITUTION: f32 = 0.95;
/// Projectiles slower than this on both axes are removed
pub const REST_SPEED: f32 = 0.1;

pub const TARGET_MAX_SIZE: f32 = 60.0;
pub const TARGET_MIN_SIZE: f32 = 20.0;
pub const BONUS_SIZE: f32 = 30.0;
/// Bonus target keeps this far (Chebyshev, top-left corners) from the main target
pub const BONUS_SEPARATION: f32 = 100.0;
/// Ticks between a main target hit and the next level (300 ms)
pub const LEVEL_DELAY_TICKS: u32 = 15;

pub const BASE_AMMO: u32 = 5;
pub const BASE_BONUS_AMMO: u32 = 1;
pub const BASE_MONEY_PER_LEVEL: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Projectile {
    pub fn circle(&self) -> Circle {
        Circle::new(self.pos, PROJECTILE_RADIUS)
    }
}

/// A round target; `bounds` is its bounding square
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: EntityId,
    pub bounds: Rect,
}

impl Target {
    pub fn circle(&self) -> Circle {
        Circle::new(self.bounds.center(), self.bounds.size.x * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: EntityId,
    pub rect: Rect,
}

/// Circle inscribed in a square, used when placing targets around obstacles
fn inscribed(rect: &Rect) -> Circle {
    Circle::new(rect.center(), rect.size.x * 0.5)
}

fn obstacle_circles(obstacles: &[Obstacle]) -> impl Iterator<Item = Circle> + '_ {
    obstacles.iter().map(|o| inscribed(&o.rect))
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum BallsEvent {
    Fired { ammo_left: u32 },
    FireRejected,
    TargetHit { level: u32, earned: u64 },
    BonusHit { ammo: u32 },
    LevelBuilt { level: u32 },
    TargetSkipped,
    BonusSkipped,
    ObstaclePlaced(EntityId),
    ObstacleSkipped,
    Purchased(Upgrade),
    PurchaseRejected(ShopError),
    GameOver { level: u32 },
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct BallsInput {
    /// Net aim key presses since the last tick, negative turns left
    pub turn: i32,
    /// Slow-aim modifier pressed (`Some(true)`) or released (`Some(false)`)
    pub slow_aim: Option<bool>,
    pub fire: bool,
    pub purchase: Option<Upgrade>,
}

/// Complete Balls state
#[derive(Debug, Clone)]
pub struct BallsState {
    rng: GameRng,
    ids: IdAllocator,
    sight_id: EntityId,
    pub phase: GamePhase,
    pub level: u32,
    pub money: u64,
    pub ammo: u32,
    pub upgrades: Upgrades,
    pub prices: PriceList,
    /// Degrees from vertical, positive to the right
    pub sight_angle: f32,
    pub slow_aim: bool,
    pub projectiles: Vec<Projectile>,
    pub target: Option<Target>,
    pub bonus_target: Option<Target>,
    pub obstacles: Vec<Obstacle>,
    /// Ticks until the next level is built
    pub level_timer: Option<u32>,
    pub events: Vec<BallsEvent>,
}

impl BallsState {
    /// New game at level 0, already running
    pub fn new(seed: u64) -> Self {
        let mut ids = IdAllocator::default();
        let sight_id = ids.next_id();
        let mut state = Self {
            rng: seeded_rng(seed),
            ids,
            sight_id,
            phase: GamePhase::Active,
            level: 0,
            money: 0,
            ammo: BASE_AMMO,
            upgrades: Upgrades::default(),
            prices: PriceList::default(),
            sight_angle: 0.0,
            slow_aim: false,
            projectiles: Vec::new(),
            target: None,
            bonus_target: None,
            obstacles: Vec::new(),
            level_timer: None,
            events: Vec::new(),
        };
        state.build_level();
        log::info!("Balls started");
        state
    }

    pub fn max_ammo(&self) -> u32 {
        self.upgrades.max_ammo.current(BASE_AMMO)
    }

    /// Ammo granted by the bonus target
    pub fn bonus_ammo(&self) -> u32 {
        self.upgrades.bonus_ammo.current(BASE_BONUS_AMMO)
    }

    pub fn money_per_level(&self) -> u64 {
        u64::from(self.upgrades.money_per_level.current(BASE_MONEY_PER_LEVEL))
    }

    pub fn target_size(&self) -> f32 {
        (TARGET_MAX_SIZE - 2.0 * self.level as f32).max(TARGET_MIN_SIZE)
    }

    /// Rotate the sight by `presses` key presses at the current aim speed
    pub fn turn(&mut self, presses: i32) {
        let step = if self.slow_aim { SLOW_AIM_STEP } else { AIM_STEP };
        self.sight_angle += presses as f32 * step;
    }

    /// Launch a projectile along the sight
    ///
    /// With no ammo left the shot is refused, and if there is not even money
    /// for one more projectile the game ends.
    pub fn fire(&mut self) -> bool {
        if self.phase != GamePhase::Active {
            return false;
        }
        if self.ammo == 0 {
            self.events.push(BallsEvent::FireRejected);
            if self.money < self.prices.buy_ammo {
                self.game_over();
            }
            return false;
        }

        self.ammo -= 1;
        let angle = self.sight_angle.to_radians();
        let id = self.ids.next_id();
        self.projectiles.push(Projectile {
            id,
            pos: SIGHT_ORIGIN,
            vel: Vec2::new(angle.sin(), -angle.cos()) * PROJECTILE_SPEED,
        });
        self.events.push(BallsEvent::Fired {
            ammo_left: self.ammo,
        });
        true
    }

    /// Buy an upgrade; on error nothing changes
    pub fn buy(&mut self, upgrade: Upgrade) -> Result<(), ShopError> {
        if self.phase == GamePhase::GameOver {
            return Err(ShopError::GameOver);
        }

        // Check everything first, then deduct and apply
        let price = match upgrade {
            Upgrade::RemoveRandomObstacle => {
                if self.obstacles.is_empty() {
                    return Err(ShopError::NoObstacles);
                }
                self.prices.remove_random_obstacle
            }
            Upgrade::RemoveObstacleAt(_) => {
                if self.obstacles.is_empty() {
                    return Err(ShopError::NoObstacles);
                }
                self.prices.remove_selected_obstacle
            }
            Upgrade::BonusAmmo => self
                .upgrades
                .bonus_ammo
                .next()
                .ok_or(ShopError::MaxLevel(upgrade.label()))?
                .price,
            Upgrade::MaxAmmo => self
                .upgrades
                .max_ammo
                .next()
                .ok_or(ShopError::MaxLevel(upgrade.label()))?
                .price,
            Upgrade::MoneyPerLevel => self
                .upgrades
                .money_per_level
                .next()
                .ok_or(ShopError::MaxLevel(upgrade.label()))?
                .price,
            Upgrade::BuyAmmo => {
                if self.ammo >= self.max_ammo() {
                    return Err(ShopError::AmmoFull);
                }
                self.prices.buy_ammo
            }
        };
        if self.money < price {
            return Err(ShopError::InsufficientFunds {
                price,
                balance: self.money,
            });
        }

        let removed = match upgrade {
            Upgrade::RemoveRandomObstacle => Some(self.rng.random_range(0..self.obstacles.len())),
            Upgrade::RemoveObstacleAt(point) => {
                let hit = self
                    .obstacles
                    .iter()
                    .position(|o| rect_contains_point(&o.rect, point));
                if hit.is_none() {
                    return Err(ShopError::NoObstacleAt {
                        x: point.x,
                        y: point.y,
                    });
                }
                hit
            }
            _ => None,
        };

        self.money -= price;
        match upgrade {
            Upgrade::RemoveRandomObstacle | Upgrade::RemoveObstacleAt(_) => {
                if let Some(idx) = removed {
                    let obstacle = self.obstacles.remove(idx);
                    log::debug!("Obstacle {} removed", obstacle.id);
                }
            }
            Upgrade::BonusAmmo => self.upgrades.bonus_ammo.climb(),
            Upgrade::MaxAmmo => self.upgrades.max_ammo.climb(),
            Upgrade::MoneyPerLevel => self.upgrades.money_per_level.climb(),
            Upgrade::BuyAmmo => self.ammo += 1,
        }
        log::info!("Bought {} for {}, {} left", upgrade.label(), price, self.money);
        Ok(())
    }

    /// Replace both targets and add an obstacle while there are fewer than the level
    pub fn build_level(&mut self) {
        self.target = None;
        self.bonus_target = None;

        match self.place_target() {
            Placement::Placed(target) => self.target = Some(target),
            Placement::NotPlaced { .. } => self.events.push(BallsEvent::TargetSkipped),
        }
        match self.place_bonus() {
            Placement::Placed(bonus) => self.bonus_target = Some(bonus),
            Placement::NotPlaced { .. } => self.events.push(BallsEvent::BonusSkipped),
        }
        if self.obstacles.len() < self.level as usize {
            self.add_obstacle();
        }

        self.events.push(BallsEvent::LevelBuilt { level: self.level });
        log::debug!(
            "Level {} built with {} obstacles",
            self.level,
            self.obstacles.len()
        );
    }

    fn place_target(&mut self) -> Placement<Target> {
        let size = self.target_size();
        let obstacles = &self.obstacles;
        let placement = sample(
            &mut self.rng,
            PLACEMENT_ATTEMPTS,
            |rng| random_square(rng, 100..=700, 50..=150, size),
            |bounds| clear_of_circles(inscribed(bounds), obstacle_circles(obstacles), 0.0),
        );
        placement.map(|bounds| Target {
            id: self.ids.next_id(),
            bounds,
        })
    }

    fn place_bonus(&mut self) -> Placement<Target> {
        let obstacles = &self.obstacles;
        let main = self.target.map(|t| t.bounds.min);
        let placement = sample(
            &mut self.rng,
            PLACEMENT_ATTEMPTS,
            |rng| random_square(rng, 100..=700, 50..=150, BONUS_SIZE),
            |bounds| {
                let far_from_main = main.is_none_or(|m| {
                    let d = (bounds.min - m).abs();
                    d.x >= BONUS_SEPARATION || d.y >= BONUS_SEPARATION
                });
                far_from_main
                    && clear_of_circles(inscribed(bounds), obstacle_circles(obstacles), 0.0)
            },
        );
        placement.map(|bounds| Target {
            id: self.ids.next_id(),
            bounds,
        })
    }

    /// Add one obstacle clear of both targets and spaced from the others
    pub fn add_obstacle(&mut self) -> Placement<EntityId> {
        let obstacles = &self.obstacles;
        let targets: Vec<Circle> = [self.target, self.bonus_target]
            .iter()
            .flatten()
            .map(|t| t.circle())
            .collect();
        let placement = sample(
            &mut self.rng,
            PLACEMENT_ATTEMPTS,
            |rng| {
                let size = rng.random_range(30..=70) as f32;
                random_square(rng, 50..=750, 100..=400, size)
            },
            |rect| {
                clear_of_circles(inscribed(rect), targets.iter().copied(), 0.0)
                    && obstacles.iter().all(|o| {
                        let d = (rect.min - o.rect.min).abs();
                        let gap = rect.size.x + o.rect.size.x;
                        d.x >= gap || d.y >= gap
                    })
            },
        );

        match placement {
            Placement::Placed(rect) => {
                let id = self.ids.next_id();
                self.obstacles.push(Obstacle { id, rect });
                self.events.push(BallsEvent::ObstaclePlaced(id));
                Placement::Placed(id)
            }
            Placement::NotPlaced { attempts } => {
                self.events.push(BallsEvent::ObstacleSkipped);
                Placement::NotPlaced { attempts }
            }
        }
    }

    fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.events.push(BallsEvent::GameOver { level: self.level });
        log::info!("Balls over at level {}", self.level);
    }
}

fn random_square<R: Rng + ?Sized>(
    rng: &mut R,
    xs: std::ops::RangeInclusive<i32>,
    ys: std::ops::RangeInclusive<i32>,
    side: f32,
) -> Rect {
    let min = Vec2::new(rng.random_range(xs) as f32, rng.random_range(ys) as f32);
    Rect::square(min, side)
}

/// Gravity, drag and integration for one tick
pub(crate) fn integrate(p: &mut Projectile) {
    p.vel.y += GRAVITY;
    let speed = p.vel.length();
    if speed > 0.0 {
        p.vel -= DRAG * p.vel / speed;
    }
    p.pos += p.vel;
}

/// Bounce off the left, right and top walls
pub(crate) fn bounce_walls(p: &mut Projectile) {
    let left = BORDER + PROJECTILE_RADIUS;
    let right = FIELD_WIDTH - BORDER - PROJECTILE_RADIUS;
    let top = BORDER + PROJECTILE_RADIUS;
    if p.pos.x <= left {
        p.pos.x = left;
        p.vel.x = -p.vel.x * RESTITUTION;
    } else if p.pos.x >= right {
        p.pos.x = right;
        p.vel.x = -p.vel.x * RESTITUTION;
    }
    if p.pos.y <= top {
        p.pos.y = top;
        p.vel.y = -p.vel.y * RESTITUTION;
    }
}

/// Push the projectile back out of the side(s) it crossed this tick
fn bounce_obstacle(p: &mut Projectile, rect: &Rect, old: Vec2) {
    let (horizontal, vertical) = crossed_edges(rect, old, p.pos);
    let max = rect.max();
    match horizontal {
        Some(Edge::Left) => {
            p.pos.x = rect.min.x - PROJECTILE_RADIUS;
            p.vel.x = -p.vel.x.abs() * RESTITUTION;
        }
        Some(Edge::Right) => {
            p.pos.x = max.x + PROJECTILE_RADIUS;
            p.vel.x = p.vel.x.abs() * RESTITUTION;
        }
        _ => {}
    }
    match vertical {
        Some(Edge::Top) => {
            p.pos.y = rect.min.y - PROJECTILE_RADIUS;
            p.vel.y = -p.vel.y.abs() * RESTITUTION;
        }
        Some(Edge::Bottom) => {
            p.pos.y = max.y + PROJECTILE_RADIUS;
            p.vel.y = p.vel.y.abs() * RESTITUTION;
        }
        _ => {}
    }
}

fn out_of_play(p: &Projectile) -> bool {
    p.pos.y > FIELD_HEIGHT || (p.vel.x.abs() < REST_SPEED && p.vel.y.abs() < REST_SPEED)
}

/// Advance Balls by one tick
pub fn tick(state: &mut BallsState, input: &BallsInput) {
    if state.phase == GamePhase::GameOver {
        return;
    }

    // Input
    if let Some(slow) = input.slow_aim {
        state.slow_aim = slow;
    }
    if input.turn != 0 {
        state.turn(input.turn);
    }
    if let Some(upgrade) = input.purchase {
        match state.buy(upgrade) {
            Ok(()) => state.events.push(BallsEvent::Purchased(upgrade)),
            Err(e) => {
                log::debug!("Purchase of {} refused: {}", upgrade.label(), e);
                state.events.push(BallsEvent::PurchaseRejected(e));
            }
        }
    }
    if input.fire {
        state.fire();
    }
    if state.phase == GamePhase::GameOver {
        return;
    }

    // Pending level
    if let Some(remaining) = state.level_timer {
        if remaining <= 1 {
            state.level_timer = None;
            state.build_level();
        } else {
            state.level_timer = Some(remaining - 1);
        }
    }

    // Projectiles
    let projectiles = std::mem::take(&mut state.projectiles);
    let mut kept = Vec::with_capacity(projectiles.len());
    for mut p in projectiles {
        let old = p.pos;
        integrate(&mut p);
        bounce_walls(&mut p);

        if let Some(obstacle) = state
            .obstacles
            .iter()
            .find(|o| circle_rect_overlap(p.circle(), &o.rect))
        {
            bounce_obstacle(&mut p, &obstacle.rect, old);
        }

        if out_of_play(&p) {
            continue;
        }

        if state
            .target
            .is_some_and(|t| circles_overlap(p.circle(), t.circle()))
        {
            let earned = state.money_per_level();
            state.money += earned;
            state.level += 1;
            state.target = None;
            state.level_timer = Some(LEVEL_DELAY_TICKS);
            state.events.push(BallsEvent::TargetHit {
                level: state.level,
                earned,
            });
            log::info!("Level {} reached, +{} money", state.level, earned);
            continue;
        }

        if state
            .bonus_target
            .is_some_and(|t| circles_overlap(p.circle(), t.circle()))
        {
            state.ammo = (state.ammo + state.bonus_ammo()).min(state.max_ammo());
            state.bonus_target = None;
            state.events.push(BallsEvent::BonusHit { ammo: state.ammo });
            continue;
        }

        kept.push(p);
    }
    state.projectiles = kept;
}

impl Game for BallsState {
    type Input = BallsInput;
    type Event = BallsEvent;

    fn kind(&self) -> GameKind {
        GameKind::Balls
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(TICK_MS)
    }

    fn tick(&mut self, input: &BallsInput) {
        tick(self, input);
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    /// The level reached
    fn score(&self) -> u64 {
        u64::from(self.level)
    }

    fn sprites(&self) -> Vec<Sprite> {
        let mut sprites = Vec::with_capacity(self.projectiles.len() + self.obstacles.len() + 3);
        sprites.push(Sprite {
            id: self.sight_id,
            kind: SpriteKind::Sight {
                angle: self.sight_angle,
            },
            pos: SIGHT_ORIGIN,
            size: SIGHT_LENGTH,
        });
        if let Some(t) = &self.target {
            sprites.push(Sprite {
                id: t.id,
                kind: SpriteKind::Target,
                pos: t.bounds.min,
                size: t.bounds.size.x,
            });
        }
        if let Some(t) = &self.bonus_target {
            sprites.push(Sprite {
                id: t.id,
                kind: SpriteKind::BonusTarget {
                    bonus: self.bonus_ammo(),
                },
                pos: t.bounds.min,
                size: t.bounds.size.x,
            });
        }
        sprites.extend(self.obstacles.iter().map(|o| Sprite {
            id: o.id,
            kind: SpriteKind::Obstacle,
            pos: o.rect.min,
            size: o.rect.size.x,
        }));
        sprites.extend(self.projectiles.iter().map(|p| Sprite {
            id: p.id,
            kind: SpriteKind::Projectile,
            pos: p.pos,
            size: PROJECTILE_RADIUS * 2.0,
        }));
        sprites
    }

    fn drain_events(&mut self) -> Vec<BallsEvent> {
        std::mem::take(&mut self.events)
    }
}
