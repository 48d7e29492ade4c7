//! The individual score formula.
//!
//! ```text
//! score = 0.4·balance + 40·missions + 30·puzzles + 100·kills + 0.2·influence
//! ```
//!
//! rounded to two decimals. Pure and synchronous; callers recompute it
//! after every change to balance or stats.

use famiglia_protocol::{Player, Stats};

pub const BALANCE_WEIGHT: f64 = 0.4;
pub const MISSION_WEIGHT: f64 = 40.0;
pub const PUZZLE_WEIGHT: f64 = 30.0;
pub const KILL_WEIGHT: f64 = 100.0;
pub const INFLUENCE_WEIGHT: f64 = 0.2;

/// Scores a balance and stat snapshot.
///
/// Rounds half away from zero at the second decimal.
pub fn individual_score(balance: f64, stats: &Stats) -> f64 {
    let raw = balance * BALANCE_WEIGHT
        + f64::from(stats.missions_completed) * MISSION_WEIGHT
        + f64::from(stats.puzzles_solved) * PUZZLE_WEIGHT
        + f64::from(stats.kills_made) * KILL_WEIGHT
        + stats.influence_points * INFLUENCE_WEIGHT;
    round2(raw)
}

/// Scores a player record as it currently stands.
pub fn rescore(player: &Player) -> f64 {
    individual_score(player.balance, &player.stats)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
