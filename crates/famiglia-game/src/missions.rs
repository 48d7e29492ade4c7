//! Mission listing, creation, and completion.

use famiglia_protocol::{
    CompleteMissionRequest, CreateMissionRequest, Mission, MissionId, MissionStatus, PlayerId,
    Visibility,
};
use famiglia_session::Identity;
use famiglia_store::{MissionPatch, MissionStore, PlayerPatch, Storage, StoreError};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::game::require_admin;
use crate::gates::{mission_visible, missions_for_day, missions_unlocked};
use crate::{Game, GameError, Notifier};

/// Reply to "what can I do today".
///
/// While missions are locked `missions` is empty and `message` says when
/// they open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayMissions {
    pub missions: Vec<Mission>,
    pub current_day: u32,
    pub unlocked: bool,
    pub unlock_hour: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Missions for one day, after gating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionList {
    pub missions: Vec<Mission>,
    pub day: u32,
    pub unlocked: bool,
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReceipt {
    pub success: bool,
    pub mission_id: MissionId,
    pub player_id: PlayerId,
    pub reward_md: f64,
    pub reward_item: Option<String>,
    pub new_balance: f64,
    pub new_score: f64,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    /// Missions the caller can see for the current game day.
    pub async fn today_missions(&self, viewer: &Identity) -> Result<TodayMissions, GameError> {
        let state = self.state().get().await;
        if !missions_unlocked(self.now(), state.unlock_hour, viewer.is_admin()) {
            return Ok(TodayMissions {
                missions: Vec::new(),
                current_day: state.current_day,
                unlocked: false,
                unlock_hour: state.unlock_hour,
                message: Some(format!(
                    "Missions unlock at {}:00 IST",
                    state.unlock_hour
                )),
            });
        }
        let missions = self.visible_missions(viewer).await?;
        Ok(TodayMissions {
            missions: missions_for_day(missions, state.current_day),
            current_day: state.current_day,
            unlocked: true,
            unlock_hour: state.unlock_hour,
            message: None,
        })
    }

    /// Missions the caller can see for `day` (default: the current day).
    pub async fn missions(
        &self,
        viewer: &Identity,
        day: Option<u32>,
    ) -> Result<MissionList, GameError> {
        let state = self.state().get().await;
        let day = day.unwrap_or(state.current_day);
        if !missions_unlocked(self.now(), state.unlock_hour, viewer.is_admin()) {
            return Ok(MissionList {
                missions: Vec::new(),
                day,
                unlocked: false,
            });
        }
        let missions = self.visible_missions(viewer).await?;
        Ok(MissionList {
            missions: missions_for_day(missions, day),
            day,
            unlocked: true,
        })
    }

    /// One mission, if the caller may see it. Hidden missions read as
    /// missing.
    pub async fn mission(&self, viewer: &Identity, id: MissionId) -> Result<Mission, GameError> {
        self.storage()
            .missions()
            .get(id)
            .await?
            .filter(|m| mission_visible(m, viewer))
            .ok_or_else(|| GameError::NotFound(format!("mission {id}")))
    }

    /// Every mission, ungated. Admin only.
    pub async fn all_missions(&self, viewer: &Identity) -> Result<Vec<Mission>, GameError> {
        require_admin(viewer)?;
        Ok(self.storage().missions().list_all().await?)
    }

    async fn visible_missions(&self, viewer: &Identity) -> Result<Vec<Mission>, GameError> {
        let all = self.storage().missions().list_all().await?;
        Ok(all
            .into_iter()
            .filter(|m| mission_visible(m, viewer))
            .collect())
    }

    /// Creates a mission.
    ///
    /// The admin may create anything. A Don may only create family
    /// missions for their own family. Everyone else is refused.
    pub async fn create_mission(
        &self,
        creator: &Identity,
        req: CreateMissionRequest,
    ) -> Result<Mission, GameError> {
        if !creator.is_admin() {
            let player = creator.profile();
            if !player.is_don() {
                return Err(GameError::forbidden(
                    "only the admin or a Don can create missions",
                ));
            }
            if req.visibility != Visibility::Family || req.assigned_family != player.family {
                return Err(GameError::forbidden(
                    "a Don may only create family missions for their own family",
                ));
            }
        }
        validate_mission(&req)?;

        let mission = self
            .storage()
            .missions()
            .append(Mission {
                mission_id: MissionId(0),
                title: req.title,
                description: req.description,
                mission_type: req.mission_type,
                visibility: req.visibility,
                assigned_family: req.assigned_family,
                assigned_role: req.assigned_role,
                assigned_to: req.assigned_to,
                day: req.day,
                status: MissionStatus::Available,
                reward_md: req.reward_md,
                reward_item: req.reward_item.filter(|i| !i.is_empty()),
                completed_by: None,
                completion_time: None,
                version: 0,
            })
            .await?;
        info!(
            mission_id = %mission.mission_id,
            creator = %creator.player_id(),
            visibility = %mission.visibility,
            day = mission.day,
            "mission created"
        );
        Ok(mission)
    }

    /// Marks a mission completed and pays its reward.
    ///
    /// The mission is claimed first with a compare-and-swap, so two
    /// concurrent completions pay out exactly once. If the payout then
    /// fails the claim is released and the mission can be completed again. Players may only
    /// complete missions they can see, for themselves; the admin may
    /// complete any mission on behalf of a named player.
    pub async fn complete_mission(
        &self,
        caller: &Identity,
        req: CompleteMissionRequest,
    ) -> Result<CompletionReceipt, GameError> {
        let target_id = match (caller, req.player_id) {
            (Identity::Admin(_), Some(id)) => id,
            (Identity::Admin(_), None) => {
                return Err(GameError::InvalidRequest(
                    "player_id is required when the admin completes a mission".into(),
                ));
            }
            (Identity::Player(_), Some(id)) if id != caller.player_id() => {
                return Err(GameError::forbidden(
                    "players can only complete missions for themselves",
                ));
            }
            (Identity::Player(_), _) => caller.player_id(),
        };

        let target = self.require_player(&target_id).await?;
        if !target.alive {
            return Err(GameError::PlayerEliminated("complete missions"));
        }

        let missions = self.storage().missions();
        let mission = missions
            .get(req.mission_id)
            .await?
            .filter(|m| caller.is_admin() || mission_visible(m, caller))
            .ok_or_else(|| GameError::NotFound(format!("mission {}", req.mission_id)))?;
        if mission.status.is_completed() {
            return Err(GameError::AlreadyCompleted(mission.mission_id));
        }

        let claim = MissionPatch {
            status: Some(MissionStatus::Completed),
            completed_by: Some(target_id.clone()),
            completion_time: Some(self.now()),
            ..Default::default()
        };
        let claimed = match missions
            .update(mission.mission_id, claim, Some(mission.version))
            .await
        {
            Ok(claimed) => claimed,
            Err(StoreError::Conflict { .. } | StoreError::Rejected(_)) => {
                let fresh = missions.get(mission.mission_id).await?;
                return Err(match fresh {
                    Some(m) if m.status.is_completed() => {
                        GameError::AlreadyCompleted(m.mission_id)
                    }
                    _ => GameError::Conflict(format!("mission {}", mission.mission_id)),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let reward = mission.reward_md;
        let item = mission.reward_item.clone();
        let paid = self
            .mutate_player(&target_id, |p| {
                let mut items = p.items.clone();
                if let Some(item) = &item {
                    items.push(item.clone());
                }
                Ok(PlayerPatch {
                    balance: Some((p.balance + reward).max(0.0)),
                    missions_completed: Some(p.stats.missions_completed + 1),
                    items: Some(items),
                    ..Default::default()
                })
            })
            .await;
        let paid = match paid {
            Ok(paid) => paid,
            Err(e) => {
                warn!(
                    mission_id = %mission.mission_id,
                    player_id = %target_id,
                    error = %e,
                    "reward not paid, reopening mission"
                );
                if let Err(release) = missions
                    .release(claimed.mission_id, &target_id, claimed.version)
                    .await
                {
                    error!(
                        mission_id = %mission.mission_id,
                        player_id = %target_id,
                        error = %release,
                        "mission marked completed but reward was not paid"
                    );
                }
                return Err(e);
            }
        };

        if req.completion_proof.is_none() && !caller.is_admin() {
            warn!(mission_id = %mission.mission_id, "completed without proof");
        }
        info!(
            mission_id = %mission.mission_id,
            player_id = %target_id,
            reward,
            "mission completed"
        );

        Ok(CompletionReceipt {
            success: true,
            mission_id: mission.mission_id,
            player_id: target_id,
            reward_md: reward,
            reward_item: item,
            new_balance: paid.balance,
            new_score: paid.individual_score,
        })
    }
}

fn validate_mission(req: &CreateMissionRequest) -> Result<(), GameError> {
    if req.title.trim().is_empty() {
        return Err(GameError::InvalidRequest("title must not be empty".into()));
    }
    if !req.reward_md.is_finite() || req.reward_md < 0.0 {
        return Err(GameError::InvalidRequest(
            "reward_md must be a non-negative number".into(),
        ));
    }
    if req.day == 0 {
        return Err(GameError::InvalidRequest("day must be at least 1".into()));
    }
    if req.visibility == Visibility::Private && req.assigned_to.is_none() {
        return Err(GameError::InvalidRequest(
            "private missions need assigned_to".into(),
        ));
    }
    if req.visibility == Visibility::Family && req.assigned_family.is_empty() {
        return Err(GameError::InvalidRequest(
            "family missions need assigned_family".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(visibility: Visibility) -> CreateMissionRequest {
        CreateMissionRequest {
            title: "Collect".into(),
            description: String::new(),
            reward_md: 100.0,
            reward_item: None,
            visibility,
            assigned_family: "Corleone".into(),
            assigned_role: famiglia_protocol::ALL.into(),
            assigned_to: None,
            day: 1,
            mission_type: "General".into(),
        }
    }

    #[test]
    fn test_validate_mission_private_needs_assignee() {
        assert!(matches!(
            validate_mission(&request(Visibility::Private)),
            Err(GameError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_mission_rejects_negative_reward() {
        let mut req = request(Visibility::Public);
        req.reward_md = -5.0;
        assert!(validate_mission(&req).is_err());
    }

    #[test]
    fn test_validate_mission_accepts_family_mission() {
        assert!(validate_mission(&request(Visibility::Family)).is_ok());
    }
}
