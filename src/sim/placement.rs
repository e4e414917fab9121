//! Bounded rejection sampling for spawn positions
//!
//! Spawns are best-effort: a sampler draws up to `attempts` uniform candidates
//! and returns the first one the acceptance predicate allows. Exhaustion is a
//! normal outcome reported as [`Placement::NotPlaced`]; callers skip the
//! spawn for this tick.

use rand::Rng;

use super::geometry::{Cell, Circle, Direction};

/// Outcome of a placement attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement<T> {
    Placed(T),
    NotPlaced { attempts: u32 },
}

impl<T> Placement<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Placement<U> {
        match self {
            Placement::Placed(value) => Placement::Placed(f(value)),
            Placement::NotPlaced { attempts } => Placement::NotPlaced { attempts },
        }
    }
}

/// Draw candidates from `propose` until `accept` allows one, at most `attempts` times
pub fn sample<R, T>(
    rng: &mut R,
    attempts: u32,
    mut propose: impl FnMut(&mut R) -> T,
    mut accept: impl FnMut(&T) -> bool,
) -> Placement<T>
where
    R: Rng + ?Sized,
{
    for _ in 0..attempts {
        let candidate = propose(rng);
        if accept(&candidate) {
            return Placement::Placed(candidate);
        }
    }
    log::debug!("Placement gave up after {} attempts", attempts);
    Placement::NotPlaced { attempts }
}

/// Euclidean clearance: the candidate's edge stays at least `margin` away from every other circle
pub fn clear_of_circles(
    candidate: Circle,
    others: impl IntoIterator<Item = Circle>,
    margin: f32,
) -> bool {
    others.into_iter().all(|other| {
        candidate.center.distance(other.center) >= candidate.radius + other.radius + margin
    })
}

/// Chebyshev clearance: every cell is at least `min_distance` cells away
pub fn clear_of_cells(candidate: Cell, others: impl IntoIterator<Item = Cell>, min_distance: i32) -> bool {
    others
        .into_iter()
        .all(|other| candidate.chebyshev(other) >= min_distance)
}

/// Whether `cell` lies in the band a moving head is about to sweep
///
/// The lane is three cells wide (head column/row ± 1) and `look_ahead` cells
/// long in the travel direction, including the head's own row/column.
pub fn in_travel_lane(cell: Cell, head: Cell, direction: Direction, look_ahead: i32) -> bool {
    match direction {
        Direction::Up => {
            (cell.x - head.x).abs() <= 1 && cell.y >= head.y - look_ahead && cell.y <= head.y
        }
        Direction::Down => {
            (cell.x - head.x).abs() <= 1 && cell.y >= head.y && cell.y <= head.y + look_ahead
        }
        Direction::Left => {
            (cell.y - head.y).abs() <= 1 && cell.x >= head.x - look_ahead && cell.x <= head.x
        }
        Direction::Right => {
            (cell.y - head.y).abs() <= 1 && cell.x >= head.x && cell.x <= head.x + look_ahead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::seeded_rng;
    use glam::Vec2;
    use proptest::prelude::*;

    #[test]
    fn test_sample_returns_first_accepted() {
        let mut rng = seeded_rng(7);
        let mut n = 0;
        let result = sample(
            &mut rng,
            10,
            |_| {
                n += 1;
                n
            },
            |v| *v == 3,
        );
        assert_eq!(result, Placement::Placed(3));
    }

    #[test]
    fn test_sample_exhaustion_is_explicit() {
        let mut rng = seeded_rng(7);
        let result = sample(&mut rng, 25, |r| r.random_range(0..10), |v| *v > 100);
        assert_eq!(result, Placement::NotPlaced { attempts: 25 });
    }

    #[test]
    fn test_travel_lane() {
        let head = Cell::new(10, 10);
        assert!(in_travel_lane(Cell::new(12, 9), head, Direction::Right, 3));
        assert!(in_travel_lane(Cell::new(13, 11), head, Direction::Right, 3));
        assert!(!in_travel_lane(Cell::new(14, 10), head, Direction::Right, 3));
        assert!(!in_travel_lane(Cell::new(9, 10), head, Direction::Right, 3));
        assert!(in_travel_lane(Cell::new(10, 7), head, Direction::Up, 3));
        assert!(!in_travel_lane(Cell::new(12, 8), head, Direction::Up, 3));
    }

    proptest! {
        #[test]
        fn prop_placed_circles_keep_separation(
            seed in any::<u64>(),
            existing in prop::collection::vec((20.0f32..780.0, 20.0f32..580.0, 5.0f32..40.0), 0..12),
            radius in 5.0f32..40.0,
            margin in 0.0f32..30.0,
        ) {
            let others: Vec<Circle> = existing
                .iter()
                .map(|&(x, y, r)| Circle::new(Vec2::new(x, y), r))
                .collect();
            let mut rng = seeded_rng(seed);
            let placement = sample(
                &mut rng,
                200,
                |r| Circle::new(Vec2::new(r.random_range(0.0..800.0), r.random_range(0.0..600.0)), radius),
                |c| clear_of_circles(*c, others.iter().copied(), margin),
            );
            if let Placement::Placed(c) = placement {
                for other in &others {
                    prop_assert!(c.center.distance(other.center) >= c.radius + other.radius + margin);
                }
            }
        }

        #[test]
        fn prop_placed_cells_keep_chebyshev_gap(
            seed in any::<u64>(),
            existing in prop::collection::vec((0i32..40, 0i32..40), 0..20),
            gap in 1i32..4,
        ) {
            let others: Vec<Cell> = existing.iter().map(|&(x, y)| Cell::new(x, y)).collect();
            let mut rng = seeded_rng(seed);
            let placement = sample(
                &mut rng,
                100,
                |r| Cell::new(r.random_range(0..40), r.random_range(0..40)),
                |c| clear_of_cells(*c, others.iter().copied(), gap),
            );
            if let Placement::Placed(c) = placement {
                prop_assert!(others.iter().all(|o| o.chebyshev(c) >= gap));
            }
        }
    }
}
