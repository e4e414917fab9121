//! Rating leaderboard
//!
//! Every game is worth up to [`RATING_PER_GAME`] points. Within a game,
//! players are ranked by high score and the points fall off linearly from
//! first place to last. The board keeps the players with the best totals.

use std::collections::BTreeMap;

use super::accounts::Account;
use crate::games::GameKind;

/// Rating awarded to the best player of a game
pub const RATING_PER_GAME: f64 = 1.25;

/// Rating for rank `rank` (0-based) among `players` players of one game
pub fn rank_rating(rank: usize, players: usize) -> f64 {
    if players <= 1 {
        return RATING_PER_GAME;
    }
    RATING_PER_GAME * (1.0 - rank as f64 / (players - 1) as f64)
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub username: String,
    pub rating: f64,
    pub high_scores: BTreeMap<GameKind, u64>,
}

impl Standing {
    pub fn high_score(&self, kind: GameKind) -> u64 {
        self.high_scores.get(&kind).copied().unwrap_or(0)
    }
}

/// Top players by total rating
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    pub standings: Vec<Standing>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate every account and keep the best `size`
    pub fn from_accounts(accounts: &[Account], size: usize) -> Self {
        let mut ratings: BTreeMap<&str, f64> = accounts
            .iter()
            .map(|a| (a.username.as_str(), 0.0))
            .collect();

        for kind in GameKind::ALL {
            let mut ranked: Vec<(&str, u64)> = accounts
                .iter()
                .map(|a| (a.username.as_str(), a.high_score(kind)))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            let players = ranked.len();
            for (rank, (name, _)) in ranked.into_iter().enumerate() {
                if let Some(total) = ratings.get_mut(name) {
                    *total += rank_rating(rank, players);
                }
            }
        }

        let mut standings: Vec<Standing> = accounts
            .iter()
            .map(|a| Standing {
                username: a.username.clone(),
                rating: ratings.get(a.username.as_str()).copied().unwrap_or(0.0),
                high_scores: GameKind::ALL
                    .into_iter()
                    .map(|kind| (kind, a.high_score(kind)))
                    .collect(),
            })
            .collect();

        standings.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.username.cmp(&b.username))
        });
        standings.truncate(size);

        log::debug!("Leaderboard rebuilt with {} players", standings.len());
        Self { standings }
    }

    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    pub fn leader(&self) -> Option<&Standing> {
        self.standings.first()
    }

    /// Position of a player on the board (1-indexed)
    pub fn rank_of(&self, username: &str) -> Option<usize> {
        self.standings
            .iter()
            .position(|s| s.username == username)
            .map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, scores: [u64; 4]) -> Account {
        let mut account = Account::new(name);
        for (kind, score) in GameKind::ALL.into_iter().zip(scores) {
            account.games.entry(kind).or_default().record(score);
        }
        account
    }

    #[test]
    fn test_rank_rating() {
        assert_eq!(rank_rating(0, 1), 1.25);
        assert_eq!(rank_rating(0, 3), 1.25);
        assert_eq!(rank_rating(1, 3), 0.625);
        assert_eq!(rank_rating(2, 3), 0.0);
    }

    #[test]
    fn test_single_player_gets_full_rating() {
        let board = Leaderboard::from_accounts(&[account("solo", [0, 0, 0, 0])], 10);
        assert_eq!(board.standings.len(), 1);
        assert_eq!(board.standings[0].rating, 5.0);
    }

    #[test]
    fn test_ratings_sum_per_game() {
        let accounts = vec![
            account("a", [10, 0, 5, 0]),
            account("b", [20, 3, 5, 0]),
            account("c", [0, 1, 1, 0]),
        ];
        let board = Leaderboard::from_accounts(&accounts, 10);

        let names: Vec<&str> = board.standings.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        let b = &board.standings[0];
        // Ties on letters and digits go to "a" by name
        assert!((b.rating - (1.25 + 1.25 + 0.625 + 0.625)).abs() < 1e-9);
        assert_eq!(b.high_score(GameKind::Snake), 20);
        assert_eq!(board.rank_of("c"), Some(3));
        assert_eq!(board.rank_of("nobody"), None);
    }

    #[test]
    fn test_truncates_to_size() {
        let accounts: Vec<Account> = (0..15)
            .map(|i| account(&format!("p{i:02}"), [i, i, i, i]))
            .collect();
        let board = Leaderboard::from_accounts(&accounts, 10);
        assert_eq!(board.standings.len(), 10);
        assert_eq!(board.leader().unwrap().username, "p14");
        assert!(Leaderboard::new().is_empty());
    }
}
