//! Collision detection and shape geometry shared by all games
//!
//! Continuous shapes (circles, rectangles) live in pixel space; grid shapes
//! (cells, cell squares) live in cell units and are used by Snake.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// A circle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned rectangle, `min` is the top-left corner (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Square with the given top-left corner and side
    pub fn square(min: Vec2, side: f32) -> Self {
        Self::new(min, Vec2::splat(side))
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }
}

/// Circle-circle hit: distance between centers is below the sum of radii
#[inline]
pub fn circles_overlap(a: Circle, b: Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// Closest point on (or in) the rectangle to `point`
#[inline]
pub fn closest_point(rect: &Rect, point: Vec2) -> Vec2 {
    point.clamp(rect.min, rect.max())
}

/// Circle-rectangle hit using the nearest-point clamp
pub fn circle_rect_overlap(circle: Circle, rect: &Rect) -> bool {
    let nearest = closest_point(rect, circle.center);
    circle.center.distance(nearest) < circle.radius
}

/// Point-in-rectangle, edges inclusive
pub fn rect_contains_point(rect: &Rect, point: Vec2) -> bool {
    let max = rect.max();
    point.x >= rect.min.x && point.x <= max.x && point.y >= rect.min.y && point.y <= max.y
}

/// Rectangle edge crossed by a moving point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Edges crossed when a point moves from `old` to `new`
///
/// Returns at most one horizontal (Left/Right) and one vertical (Top/Bottom) edge.
pub fn crossed_edges(rect: &Rect, old: Vec2, new: Vec2) -> (Option<Edge>, Option<Edge>) {
    let max = rect.max();
    let horizontal = if old.x < rect.min.x && new.x >= rect.min.x {
        Some(Edge::Left)
    } else if old.x > max.x && new.x <= max.x {
        Some(Edge::Right)
    } else {
        None
    };
    let vertical = if old.y < rect.min.y && new.y >= rect.min.y {
        Some(Edge::Top)
    } else if old.y > max.y && new.y <= max.y {
        Some(Edge::Bottom)
    } else {
        None
    };
    (horizontal, vertical)
}

/// Grid direction (screen coordinates, Up decreases y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

/// A grid cell in cell units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance
    #[inline]
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Neighbour in `dir`, wrapping around a `width` x `height` field
    pub fn step_wrapped(self, dir: Direction, width: i32, height: i32) -> Cell {
        let d = dir.delta();
        Cell::new(
            (self.x + d.x).rem_euclid(width),
            (self.y + d.y).rem_euclid(height),
        )
    }
}

/// Square footprint of `size` x `size` cells anchored at its top-left `origin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSquare {
    pub origin: Cell,
    pub size: i32,
}

impl CellSquare {
    pub fn new(origin: Cell, size: i32) -> Self {
        Self { origin, size }
    }

    /// Grid-cell occupancy test
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.origin.x
            && cell.x < self.origin.x + self.size
            && cell.y >= self.origin.y
            && cell.y < self.origin.y + self.size
    }

    /// Every cell covered, row by row
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.size).flat_map(move |j| {
            (0..self.size).map(move |i| Cell::new(self.origin.x + i, self.origin.y + j))
        })
    }

    /// Smallest Chebyshev distance from `cell` to any covered cell
    pub fn chebyshev_to(&self, cell: Cell) -> i32 {
        self.cells().map(|c| c.chebyshev(cell)).min().unwrap_or(i32::MAX)
    }

    /// Whether the footprint fits inside a `width` x `height` field
    pub fn fits(&self, width: i32, height: i32) -> bool {
        self.origin.x >= 0
            && self.origin.y >= 0
            && self.origin.x + self.size <= width
            && self.origin.y + self.size <= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_circles_overlap_touching_is_miss() {
        let a = Circle::new(Vec2::new(0.0, 0.0), 5.0);
        let b = Circle::new(Vec2::new(10.0, 0.0), 5.0);
        assert!(!circles_overlap(a, b));

        let c = Circle::new(Vec2::new(9.9, 0.0), 5.0);
        assert!(circles_overlap(a, c));
    }

    #[test]
    fn test_circle_rect_overlap_nearest_point() {
        let rect = Rect::square(Vec2::new(100.0, 100.0), 50.0);

        // Just left of the left edge
        assert!(circle_rect_overlap(Circle::new(Vec2::new(96.0, 120.0), 5.0), &rect));
        // Diagonal from the corner, clamp point is the corner (distance ~5.66)
        assert!(!circle_rect_overlap(Circle::new(Vec2::new(96.0, 96.0), 5.0), &rect));
        // Center inside
        assert!(circle_rect_overlap(Circle::new(Vec2::new(125.0, 125.0), 1.0), &rect));
    }

    #[test]
    fn test_rect_contains_point_inclusive() {
        let rect = Rect::square(Vec2::new(10.0, 10.0), 20.0);
        assert!(rect_contains_point(&rect, Vec2::new(10.0, 30.0)));
        assert!(!rect_contains_point(&rect, Vec2::new(30.1, 20.0)));
    }

    #[test]
    fn test_crossed_edges() {
        let rect = Rect::square(Vec2::new(100.0, 100.0), 50.0);
        let (h, v) = crossed_edges(&rect, Vec2::new(95.0, 120.0), Vec2::new(105.0, 120.0));
        assert_eq!(h, Some(Edge::Left));
        assert_eq!(v, None);

        let (h, v) = crossed_edges(&rect, Vec2::new(120.0, 155.0), Vec2::new(120.0, 148.0));
        assert_eq!(h, None);
        assert_eq!(v, Some(Edge::Bottom));
    }

    #[test]
    fn test_cell_wraps() {
        let cell = Cell::new(0, 39);
        assert_eq!(cell.step_wrapped(Direction::Left, 40, 40), Cell::new(39, 39));
        assert_eq!(cell.step_wrapped(Direction::Down, 40, 40), Cell::new(0, 0));
    }

    #[test]
    fn test_cell_square_occupancy() {
        let square = CellSquare::new(Cell::new(5, 5), 2);
        assert!(square.contains(Cell::new(6, 6)));
        assert!(!square.contains(Cell::new(7, 5)));
        assert_eq!(square.cells().count(), 4);
        assert_eq!(square.chebyshev_to(Cell::new(9, 6)), 3);
    }

    proptest! {
        #[test]
        fn prop_circle_hit_is_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0, ar in 0.0f32..100.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0, br in 0.0f32..100.0,
        ) {
            let a = Circle::new(Vec2::new(ax, ay), ar);
            let b = Circle::new(Vec2::new(bx, by), br);
            prop_assert_eq!(circles_overlap(a, b), circles_overlap(b, a));
        }

        #[test]
        fn prop_chebyshev_is_symmetric(ax in -50i32..50, ay in -50i32..50, bx in -50i32..50, by in -50i32..50) {
            let a = Cell::new(ax, ay);
            let b = Cell::new(bx, by);
            prop_assert_eq!(a.chebyshev(b), b.chebyshev(a));
        }
    }
}
