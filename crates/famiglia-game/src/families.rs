//! Family aggregates and leaderboards.
//!
//! Families are not stored; they are derived from player records every
//! time they are asked for.

use std::collections::BTreeMap;

use famiglia_protocol::{FamilySummary, Player, PlayerId};
use famiglia_session::Identity;
use famiglia_store::{PlayerStore, Storage};
use serde::Serialize;

use crate::{Game, GameError, Notifier};

/// One member, as shown on a family page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub player_id: Option<PlayerId>,
    pub name: String,
    pub role: String,
    pub balance: f64,
    pub individual_score: f64,
    pub missions_completed: u32,
    pub alive: bool,
}

impl From<&Player> for MemberView {
    fn from(p: &Player) -> Self {
        Self {
            player_id: p.player_id.clone(),
            name: p.name.clone(),
            role: p.role.clone(),
            balance: p.balance,
            individual_score: p.individual_score,
            missions_completed: p.stats.missions_completed,
            alive: p.alive,
        }
    }
}

/// A family with its members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyMembers {
    pub family: FamilySummary,
    pub members: Vec<MemberView>,
}

/// Groups players by family and sums their money and stats.
///
/// Unaffiliated players are skipped. The result is sorted by
/// `total_money`, richest first; ties keep alphabetical order.
pub fn aggregate(players: &[Player]) -> Vec<FamilySummary> {
    let mut families: BTreeMap<&str, FamilySummary> = BTreeMap::new();
    for player in players.iter().filter(|p| p.has_family()) {
        let summary = families
            .entry(player.family.as_str())
            .or_insert_with(|| FamilySummary {
                family_name: player.family.clone(),
                don: String::new(),
                total_money: 0.0,
                members: 0,
                kills: 0,
                missions_completed: 0,
            });
        summary.total_money += player.balance;
        summary.members += 1;
        summary.kills += player.stats.kills_made;
        summary.missions_completed += player.stats.missions_completed;
        if summary.don.is_empty() && player.is_don() {
            summary.don = player.name.clone();
        }
    }
    let mut ranked: Vec<FamilySummary> = families.into_values().collect();
    ranked.sort_by(|a, b| b.total_money.total_cmp(&a.total_money));
    ranked
}

impl<S: Storage, N: Notifier> Game<S, N> {
    /// Every family, richest first.
    pub async fn families(&self) -> Result<Vec<FamilySummary>, GameError> {
        let players = self.storage().players().list_all().await?;
        Ok(aggregate(&players))
    }

    /// The top `limit` families.
    pub async fn family_leaderboard(&self, limit: usize) -> Result<Vec<FamilySummary>, GameError> {
        let mut families = self.families().await?;
        families.truncate(limit);
        Ok(families)
    }

    /// One family's summary.
    pub async fn family(&self, name: &str) -> Result<FamilySummary, GameError> {
        self.families()
            .await?
            .into_iter()
            .find(|f| f.family_name == name)
            .ok_or_else(|| GameError::NotFound(format!("family {name}")))
    }

    /// One family's summary and members.
    pub async fn family_members(&self, name: &str) -> Result<FamilyMembers, GameError> {
        let players = self.storage().players().list_all().await?;
        let members: Vec<Player> = players.into_iter().filter(|p| p.family == name).collect();
        let family = aggregate(&members)
            .into_iter()
            .next()
            .ok_or_else(|| GameError::NotFound(format!("family {name}")))?;
        Ok(FamilyMembers {
            family,
            members: members.iter().map(MemberView::from).collect(),
        })
    }

    /// The caller's own family.
    pub async fn my_family(&self, caller: &Identity) -> Result<FamilyMembers, GameError> {
        let name = caller.family();
        if name.is_empty() {
            return Err(GameError::NotFound("you are not in a family".into()));
        }
        self.family_members(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, family: &str, balance: f64, role: &str) -> Player {
        let mut p = Player::new(name, &format!("{name}@example.com"), "pw");
        p.family = family.into();
        p.balance = balance;
        p.role = role.into();
        p
    }

    #[test]
    fn test_aggregate_sums_and_sorts_by_money() {
        let mut vito = member("Vito", "Corleone", 500.0, "Don");
        vito.stats.kills_made = 2;
        let players = vec![
            vito,
            member("Sonny", "Corleone", 100.0, "Soldier"),
            member("Philip", "Tattaglia", 900.0, "Don"),
            member("Drifter", "", 10_000.0, "Soldier"),
        ];

        let families = aggregate(&players);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].family_name, "Tattaglia");
        assert_eq!(families[1].family_name, "Corleone");
        assert_eq!(families[1].total_money, 600.0);
        assert_eq!(families[1].members, 2);
        assert_eq!(families[1].kills, 2);
        assert_eq!(families[1].don, "Vito");
    }

    #[test]
    fn test_aggregate_family_without_don_has_empty_don() {
        let families = aggregate(&[member("Luca", "Barzini", 10.0, "Enforcer")]);
        assert_eq!(families[0].don, "");
    }

    #[test]
    fn test_aggregate_no_players_is_empty() {
        assert!(aggregate(&[]).is_empty());
    }
}
