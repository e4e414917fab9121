//! Render sync
//!
//! Games expose a flat sprite snapshot each frame. [`SceneSync`] diffs it
//! against the previous snapshot and pushes draw/update/delete operations keyed
//! by entity id to a [`Surface`]. The simulation never reads from the surface.

use std::collections::BTreeMap;

use glam::Vec2;

use super::EntityId;

/// What a sprite depicts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteKind {
    /// Balls: a fired projectile
    Projectile,
    /// Balls: the level target
    Target,
    /// Balls: the ammo bonus target, labelled with its bonus
    BonusTarget { bonus: u32 },
    /// Balls: a square obstacle
    Obstacle,
    /// Balls: aiming line, angle in degrees from vertical
    Sight { angle: f32 },
    /// Letters/Digits: a falling symbol
    Symbol { glyph: char, fake: bool },
    /// Snake: one body segment
    SnakeSegment,
    /// Snake: food worth `value` points
    Food { value: u32 },
    /// Snake: a mine
    Mine,
}

/// One drawable entity; `pos` is the top-left corner for squares and the center for circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub id: EntityId,
    pub kind: SpriteKind,
    pub pos: Vec2,
    pub size: f32,
}

/// Operation pushed to the drawing surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Draw(Sprite),
    Update(Sprite),
    Delete(EntityId),
}

/// External drawing surface
pub trait Surface {
    fn apply(&mut self, op: SurfaceOp);
}

/// Surface that stores every operation
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn apply(&mut self, op: SurfaceOp) {
        self.ops.push(op);
    }
}

/// Surface that only tallies operations by type
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingSurface {
    pub draws: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl CountingSurface {
    pub fn total(&self) -> usize {
        self.draws + self.updates + self.deletes
    }
}

impl Surface for CountingSurface {
    fn apply(&mut self, op: SurfaceOp) {
        match op {
            SurfaceOp::Draw(_) => self.draws += 1,
            SurfaceOp::Update(_) => self.updates += 1,
            SurfaceOp::Delete(_) => self.deletes += 1,
        }
    }
}

/// Snapshot differ between the simulation and a surface
#[derive(Debug, Default)]
pub struct SceneSync {
    last: BTreeMap<EntityId, Sprite>,
}

impl SceneSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the difference between the previous snapshot and `sprites`
    ///
    /// Returns the number of operations emitted.
    pub fn sync(&mut self, sprites: &[Sprite], surface: &mut dyn Surface) -> usize {
        let mut ops = 0;
        let mut next = BTreeMap::new();

        for sprite in sprites {
            match self.last.remove(&sprite.id) {
                None => {
                    surface.apply(SurfaceOp::Draw(*sprite));
                    ops += 1;
                }
                Some(previous) if previous != *sprite => {
                    surface.apply(SurfaceOp::Update(*sprite));
                    ops += 1;
                }
                Some(_) => {}
            }
            next.insert(sprite.id, *sprite);
        }

        // Whatever is left was not in this snapshot
        for id in self.last.keys() {
            surface.apply(SurfaceOp::Delete(*id));
            ops += 1;
        }

        self.last = next;
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(id: u32, x: f32) -> Sprite {
        Sprite {
            id: EntityId(id),
            kind: SpriteKind::Projectile,
            pos: Vec2::new(x, 0.0),
            size: 10.0,
        }
    }

    #[test]
    fn test_sync_draws_updates_and_deletes() {
        let mut sync = SceneSync::new();
        let mut surface = RecordingSurface::default();

        assert_eq!(sync.sync(&[sprite(1, 0.0), sprite(2, 0.0)], &mut surface), 2);
        assert!(matches!(surface.ops[0], SurfaceOp::Draw(_)));

        surface.ops.clear();
        // 1 moved, 2 unchanged, 3 is new
        let ops = sync.sync(&[sprite(1, 5.0), sprite(2, 0.0), sprite(3, 0.0)], &mut surface);
        assert_eq!(ops, 2);
        assert_eq!(surface.ops[0], SurfaceOp::Update(sprite(1, 5.0)));
        assert_eq!(surface.ops[1], SurfaceOp::Draw(sprite(3, 0.0)));

        surface.ops.clear();
        sync.sync(&[sprite(3, 0.0)], &mut surface);
        assert_eq!(
            surface.ops,
            vec![SurfaceOp::Delete(EntityId(1)), SurfaceOp::Delete(EntityId(2))]
        );
    }

    #[test]
    fn test_counting_surface() {
        let mut sync = SceneSync::new();
        let mut surface = CountingSurface::default();
        sync.sync(&[sprite(1, 0.0), sprite(2, 0.0)], &mut surface);
        sync.sync(&[sprite(1, 1.0)], &mut surface);
        assert_eq!(
            surface,
            CountingSurface {
                draws: 2,
                updates: 1,
                deletes: 1
            }
        );
        assert_eq!(surface.total(), 4);
    }
}
