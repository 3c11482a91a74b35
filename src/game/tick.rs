//! Authoritative Simulation Tick
//!
//! One fixed-rate step: resolve the pickup, then rank. Movement is not
//! part of the tick; intents are applied to the world as they arrive.

use crate::game::collision::find_pickup;
use crate::game::ranking::{rank, RankEntry};
use crate::game::state::{Collectible, PlayerId, WorldError, WorldState};

/// A collectible pickup resolved during a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Pickup {
    /// Player credited with the pickup
    pub player_id: PlayerId,
    /// Player score after the award
    pub new_score: u32,
    /// Replacement collectible
    pub collectible: Collectible,
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick number just processed
    pub tick: u64,
    /// Pickup granted this tick, at most one
    pub pickup: Option<Pickup>,
    /// Leaderboard after the pickup
    pub ranks: Vec<RankEntry>,
}

impl TickResult {
    /// Whether the collectible was replaced this tick.
    pub fn collectible_changed(&self) -> bool {
        self.pickup.is_some()
    }
}

/// Run one simulation tick.
///
/// If several players overlap the collectible, only the first one in
/// identity order scores; the replacement is not re-checked until the
/// next tick.
pub fn tick(world: &mut WorldState) -> Result<TickResult, WorldError> {
    world.tick += 1;

    let mut result = TickResult {
        tick: world.tick,
        ..Default::default()
    };

    if let Some(player_id) = find_pickup(world) {
        let new_score = world.award_collectible(&player_id)?;
        result.pickup = Some(Pickup {
            player_id,
            new_score,
            collectible: world.collectible(),
        });
    }

    result.ranks = rank(world.players());

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::state::ArenaConfig;

    fn id(n: u8) -> PlayerId {
        PlayerId::new([n; 16])
    }

    fn world_with(players: &[(u8, Vec2)]) -> WorldState {
        let mut world = WorldState::new(ArenaConfig::default(), 777);
        for (n, pos) in players {
            world.register(id(*n)).unwrap();
            world.player_mut(&id(*n)).unwrap().position = *pos;
        }
        world
    }

    #[test]
    fn test_tick_without_pickup() {
        let mut world = world_with(&[(1, Vec2::new(0.0, 0.0))]);
        world.set_collectible(Vec2::new(400.0, 400.0));
        let before = world.collectible();

        let result = tick(&mut world).unwrap();

        assert_eq!(result.tick, 1);
        assert!(!result.collectible_changed());
        assert_eq!(world.collectible(), before);
        assert_eq!(result.ranks.len(), 1);
        assert_eq!(result.ranks[0].score, 0);
    }

    #[test]
    fn test_tick_counter_advances() {
        let mut world = world_with(&[]);
        for expected in 1..=5 {
            assert_eq!(tick(&mut world).unwrap().tick, expected);
        }
        assert_eq!(world.tick, 5);
    }

    #[test]
    fn test_pickup_awards_and_respawns() {
        let mut world = world_with(&[(1, Vec2::new(0.0, 0.0))]);
        world.set_collectible(Vec2::new(10.0, 10.0));

        let result = tick(&mut world).unwrap();

        let pickup = result.pickup.expect("expected a pickup");
        assert_eq!(pickup.player_id, id(1));
        assert_eq!(pickup.new_score, 10);
        assert_eq!(pickup.collectible, world.collectible());
        assert_ne!(world.collectible().position, Vec2::new(10.0, 10.0));
        assert_eq!(result.ranks[0].score, 10);
    }

    #[test]
    fn test_single_pickup_per_tick() {
        let spot = Vec2::new(200.0, 200.0);
        let mut world = world_with(&[(1, spot), (2, spot), (3, spot)]);
        world.set_collectible(Vec2::new(205.0, 205.0));

        let result = tick(&mut world).unwrap();
        assert!(result.pickup.is_some());

        let scores: Vec<u32> = world.players().map(|p| p.score).collect();
        assert_eq!(scores.iter().filter(|&&s| s == 10).count(), 1);
        assert_eq!(scores.iter().sum::<u32>(), 10);
    }

    #[test]
    fn test_ranks_reflect_pickup() {
        let mut world = world_with(&[
            (1, Vec2::new(500.0, 500.0)),
            (2, Vec2::new(0.0, 0.0)),
        ]);
        world.set_collectible(Vec2::new(5.0, 5.0));

        let result = tick(&mut world).unwrap();

        // Player_2 scored, so it outranks the earlier registration
        assert_eq!(result.ranks[0].id, id(2));
        assert_eq!(result.ranks[1].id, id(1));
    }

    #[test]
    fn test_unregistered_player_absent_from_ranks() {
        let mut world = world_with(&[(1, Vec2::ZERO), (2, Vec2::ZERO)]);
        world.unregister(&id(1));

        let result = tick(&mut world).unwrap();
        assert!(result.ranks.iter().all(|r| r.id != id(1)));
        assert_eq!(result.ranks.len(), 1);
    }
}
