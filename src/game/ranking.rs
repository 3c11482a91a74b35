//! Leaderboard
//!
//! Derived fresh from the world on every tick; nothing here is stored.

use std::cmp::Reverse;
use serde::{Serialize, Deserialize};

use crate::game::state::{PlayerId, PlayerRecord};

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Player identifier
    pub id: PlayerId,
    /// Current score
    pub score: u32,
    /// Display name
    pub display_name: String,
}

/// Order players by score, highest first.
///
/// Equal scores keep registration order, so the earlier player ranks
/// higher and the result does not depend on map iteration order.
pub fn rank<'a>(players: impl IntoIterator<Item = &'a PlayerRecord>) -> Vec<RankEntry> {
    let mut ordered: Vec<&PlayerRecord> = players.into_iter().collect();
    ordered.sort_by_key(|p| (Reverse(p.score), p.joined_seq));

    ordered.into_iter()
        .map(|p| RankEntry {
            id: p.id,
            score: p.score,
            display_name: p.display_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;

    fn record(byte: u8, seq: u64, score: u32) -> PlayerRecord {
        PlayerRecord {
            // Identity order deliberately disagrees with registration order
            id: PlayerId::new([255 - byte; 16]),
            display_name: format!("Player_{}", seq),
            position: Vec2::ZERO,
            score,
            color: "hsl(0, 70%, 50%)".to_string(),
            joined_seq: seq,
        }
    }

    fn names(ranks: &[RankEntry]) -> Vec<&str> {
        ranks.iter().map(|r| r.display_name.as_str()).collect()
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let a = record(1, 1, 30);
        let b = record(2, 2, 30);
        let mut c = record(3, 3, 10);

        let ranks = rank([&c, &b, &a]);
        assert_eq!(names(&ranks), ["Player_1", "Player_2", "Player_3"]);

        c.score = 40;
        let ranks = rank([&a, &b, &c]);
        assert_eq!(names(&ranks), ["Player_3", "Player_1", "Player_2"]);
        assert_eq!(ranks[0].score, 40);
        assert_eq!(ranks[0].id, c.id);
    }

    #[test]
    fn test_empty() {
        assert!(rank(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_all_zero_scores() {
        let players: Vec<_> = (1..=5).rev().map(|n| record(n, n as u64, 0)).collect();
        let ranks = rank(&players);
        assert_eq!(
            names(&ranks),
            ["Player_1", "Player_2", "Player_3", "Player_4", "Player_5"]
        );
    }
}
