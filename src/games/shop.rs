//! Upgrade shop for the Balls game
//!
//! Prices and upgrade ladders. Purchases themselves are applied by
//! [`super::balls::BallsState::buy`] so the check and the deduction happen
//! against the same state.

use glam::Vec2;
use thiserror::Error;

/// Something the player can buy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upgrade {
    /// Remove one obstacle picked at random
    RemoveRandomObstacle,
    /// Remove the obstacle under a chosen point
    RemoveObstacleAt(Vec2),
    /// Next step on the bonus-ammo ladder
    BonusAmmo,
    /// Next step on the max-ammo ladder
    MaxAmmo,
    /// Next step on the money-per-level ladder
    MoneyPerLevel,
    /// A single projectile
    BuyAmmo,
}

impl Upgrade {
    pub fn label(&self) -> &'static str {
        match self {
            Upgrade::RemoveRandomObstacle => "remove random obstacle",
            Upgrade::RemoveObstacleAt(_) => "remove selected obstacle",
            Upgrade::BonusAmmo => "bonus ammo",
            Upgrade::MaxAmmo => "max ammo",
            Upgrade::MoneyPerLevel => "money per level",
            Upgrade::BuyAmmo => "buy ammo",
        }
    }
}

/// Why a purchase was refused; the game state is untouched in every case
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShopError {
    #[error("not enough money: {price} needed, {balance} available")]
    InsufficientFunds { price: u64, balance: u64 },

    #[error("{0} is already at its maximum level")]
    MaxLevel(&'static str),

    #[error("there are no obstacles to remove")]
    NoObstacles,

    #[error("no obstacle at ({x:.0}, {y:.0})")]
    NoObstacleAt { x: f32, y: f32 },

    #[error("ammo is already full")]
    AmmoFull,

    #[error("the game is over")]
    GameOver,
}

/// One rung of an upgrade ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub price: u64,
    pub value: u32,
}

const fn tier(price: u64, value: u32) -> Tier {
    Tier { price, value }
}

/// An upgrade ladder and how far up it the player is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    tiers: &'static [Tier],
    level: usize,
}

impl Ladder {
    pub const fn new(tiers: &'static [Tier]) -> Self {
        Self { tiers, level: 0 }
    }

    /// Next rung, if any
    pub fn next(&self) -> Option<Tier> {
        self.tiers.get(self.level).copied()
    }

    /// Value granted by the last rung bought, or `base` if none
    pub fn current(&self, base: u32) -> u32 {
        match self.level {
            0 => base,
            n => self.tiers[n - 1].value,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.tiers.len()
    }

    pub(crate) fn climb(&mut self) {
        if !self.is_maxed() {
            self.level += 1;
        }
    }
}

pub const BONUS_AMMO_TIERS: &[Tier] = &[tier(5, 2), tier(10, 3), tier(20, 4), tier(40, 5)];
pub const MAX_AMMO_TIERS: &[Tier] = &[
    tier(5, 6),
    tier(10, 7),
    tier(15, 8),
    tier(20, 9),
    tier(25, 10),
];
pub const MONEY_PER_LEVEL_TIERS: &[Tier] = &[
    tier(5, 6),
    tier(10, 7),
    tier(15, 8),
    tier(20, 9),
    tier(25, 10),
];

/// Flat prices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    pub remove_random_obstacle: u64,
    pub remove_selected_obstacle: u64,
    pub buy_ammo: u64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            remove_random_obstacle: 5,
            remove_selected_obstacle: 10,
            buy_ammo: 5,
        }
    }
}

/// Upgrade progress for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upgrades {
    pub bonus_ammo: Ladder,
    pub max_ammo: Ladder,
    pub money_per_level: Ladder,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            bonus_ammo: Ladder::new(BONUS_AMMO_TIERS),
            max_ammo: Ladder::new(MAX_AMMO_TIERS),
            money_per_level: Ladder::new(MONEY_PER_LEVEL_TIERS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_climb() {
        let mut ladder = Ladder::new(BONUS_AMMO_TIERS);
        assert_eq!(ladder.current(1), 1);
        assert_eq!(ladder.next(), Some(tier(5, 2)));

        for _ in 0..BONUS_AMMO_TIERS.len() {
            ladder.climb();
        }
        assert!(ladder.is_maxed());
        assert_eq!(ladder.next(), None);
        assert_eq!(ladder.current(1), 5);

        ladder.climb();
        assert_eq!(ladder.level(), BONUS_AMMO_TIERS.len());
    }

    #[test]
    fn test_error_messages() {
        let err = ShopError::InsufficientFunds {
            price: 5,
            balance: 3,
        };
        assert_eq!(err.to_string(), "not enough money: 5 needed, 3 available");
        assert_eq!(
            ShopError::MaxLevel("max ammo").to_string(),
            "max ammo is already at its maximum level"
        );
    }
}
