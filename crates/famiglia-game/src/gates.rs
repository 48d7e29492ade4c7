//! Pure predicates deciding what a caller may see or do right now.
//!
//! All of them take the time and game state as arguments; none reads a
//! clock or a global.
//!
//! Mission listing applies them in this order:
//!
//! ```text
//! unlock gate → visibility gate → day filter
//! ```
//!
//! and the admin passes the first two unconditionally.

use chrono::{DateTime, Timelike, Utc};
use famiglia_protocol::{ALL, Mission, Visibility};
use famiglia_session::Identity;

use crate::clock::to_game_time;

/// Local time the black market opens (23:11).
pub const MARKET_OPEN: (u32, u32) = (23, 11);

/// Local time the black market closes (00:11, the next day).
pub const MARKET_CLOSE: (u32, u32) = (0, 11);

/// Returns `true` if missions are unlocked for this caller at `now`.
pub fn missions_unlocked(now: DateTime<Utc>, unlock_hour: u32, is_admin: bool) -> bool {
    is_admin || to_game_time(now).hour() >= unlock_hour
}

/// Returns `true` if `viewer` may see `mission`.
///
/// - admin: always.
/// - public: family is "all" or the viewer's, AND role is "all" or the
///   viewer's.
/// - private: only the player named in `assigned_to`.
/// - family: every member of `assigned_family`, whatever the role.
pub fn mission_visible(mission: &Mission, viewer: &Identity) -> bool {
    let player = match viewer {
        Identity::Admin(_) => return true,
        Identity::Player(player) => player,
    };
    match mission.visibility {
        Visibility::Public => {
            matches_or_all(&mission.assigned_family, &player.family)
                && matches_or_all(&mission.assigned_role, &player.role)
        }
        Visibility::Private => {
            mission.assigned_to.is_some() && mission.assigned_to == player.player_id
        }
        Visibility::Family => {
            !player.family.is_empty() && mission.assigned_family == player.family
        }
    }
}

fn matches_or_all(assigned: &str, actual: &str) -> bool {
    assigned == ALL || assigned == actual
}

/// Keeps the missions for `day`.
pub fn missions_for_day(missions: Vec<Mission>, day: u32) -> Vec<Mission> {
    missions.into_iter().filter(|m| m.day == day).collect()
}

/// Returns `true` while the black market is open.
///
/// Open on `[23:11:00, 24:00:00)` and `[00:00:00, 00:11:00)` local time.
pub fn market_open(now: DateTime<Utc>) -> bool {
    let local = to_game_time(now);
    let (hour, minute) = (local.hour(), local.minute());
    (hour == MARKET_OPEN.0 && minute >= MARKET_OPEN.1)
        || (hour == MARKET_CLOSE.0 && minute < MARKET_CLOSE.1)
}
