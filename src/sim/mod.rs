//! Deterministic simulation module
//!
//! Shared plumbing for every game. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entities kept in spawn order)
//! - No rendering or platform dependencies

pub mod geometry;
pub mod placement;
pub mod scheduler;
pub mod surface;

use std::fmt;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

pub use geometry::{
    Cell, CellSquare, Circle, Direction, Rect, circle_rect_overlap, circles_overlap,
    closest_point, rect_contains_point,
};
pub use placement::{Placement, sample};
pub use scheduler::{Completion, FixedStep, Session, SessionStatus};
pub use surface::{CountingSurface, SceneSync, Sprite, SpriteKind, Surface, SurfaceOp};

/// RNG used by every game state
pub type GameRng = Pcg32;

/// Build the game RNG from a run seed
pub fn seeded_rng(seed: u64) -> GameRng {
    Pcg32::seed_from_u64(seed)
}

/// Current phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the start input
    #[default]
    Idle,
    /// Ticking
    Active,
    /// Run ended; terminal
    GameOver,
}

/// Stable identifier of a simulated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic entity ID source
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocate a new entity ID
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}
