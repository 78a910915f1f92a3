//! In-memory store used by the test suites.
//!
//! Mirrors the Postgres semantics that matter to callers: duplicate
//! invite codes and duplicate user memberships map to `Conflict`, and
//! the use counter only decrements while positive.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use api_types::{Invite, InviteUse, Team, TeamMember};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    CreateInviteParams, InviteStore, InviteUseCounts, MembershipStore, RecordUseParams, StoreError,
    TeamStore, UsageStore, UserStore,
};

#[derive(Default)]
struct State {
    invites: Vec<Invite>,
    members: Vec<TeamMember>,
    teams: Vec<Team>,
    users: HashMap<Uuid, String>,
    uses: Vec<InviteUse>,
}

#[derive(Default)]
pub struct MemStore {
    state: Mutex<State>,
    fail_usage: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every analytics write fail, to exercise best-effort paths.
    pub fn set_fail_usage(&self, fail: bool) {
        self.fail_usage.store(fail, Ordering::SeqCst);
    }

    pub fn add_team(&self, name: &str, owner: Uuid) -> Team {
        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by: owner,
            created_at: Utc::now(),
        };
        self.lock().teams.push(team.clone());
        team
    }

    pub fn add_user(&self, display_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().users.insert(id, display_name.to_string());
        id
    }

    pub fn memberships(&self) -> Vec<TeamMember> {
        self.lock().members.clone()
    }

    pub fn membership_count_for_user(&self, user_id: Uuid) -> usize {
        self.lock()
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .count()
    }

    pub fn invite_by_id(&self, invite_id: Uuid) -> Option<Invite> {
        self.lock().invites.iter().find(|i| i.id == invite_id).cloned()
    }

    pub fn invite_count(&self) -> usize {
        self.lock().invites.len()
    }

    pub fn recorded_uses(&self) -> Vec<InviteUse> {
        self.lock().uses.clone()
    }
}

#[async_trait::async_trait]
impl InviteStore for MemStore {
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<Invite, StoreError> {
        let mut state = self.lock();
        if state.invites.iter().any(|i| i.code == params.code) {
            return Err(StoreError::Conflict);
        }
        let invite = Invite {
            id: Uuid::new_v4(),
            team_id: params.team_id,
            created_by: params.created_by,
            code: params.code.clone(),
            uses_remaining: params.uses_remaining,
            expires_at: params.expires_at,
            created_at: Utc::now(),
        };
        state.invites.push(invite.clone());
        Ok(invite)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, StoreError> {
        Ok(self.lock().invites.iter().find(|i| i.code == code).cloned())
    }

    async fn list_for_team_by_creator(
        &self,
        team_id: Uuid,
        creator_id: Uuid,
    ) -> Result<Vec<Invite>, StoreError> {
        let mut invites: Vec<Invite> = self
            .lock()
            .invites
            .iter()
            .filter(|i| i.team_id == team_id && i.created_by == creator_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn decrement_uses(&self, invite_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let Some(invite) = state.invites.iter_mut().find(|i| i.id == invite_id) else {
            return Ok(false);
        };
        match invite.uses_remaining {
            Some(remaining) if remaining > 0 => {
                invite.uses_remaining = Some(remaining - 1);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_invite(&self, invite_id: Uuid, requester_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        let Some(invite) = state.invites.iter().find(|i| i.id == invite_id) else {
            return Err(StoreError::NotFound);
        };
        if invite.created_by != requester_id {
            return Err(StoreError::Forbidden);
        }
        state.invites.retain(|i| i.id != invite_id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl MembershipStore for MemStore {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TeamMember>, StoreError> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn insert_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<TeamMember, StoreError> {
        let mut state = self.lock();
        if state.members.iter().any(|m| m.user_id == user_id) {
            return Err(StoreError::Conflict);
        }
        let member = TeamMember {
            id: Uuid::new_v4(),
            team_id,
            user_id,
            contribution_points: 0,
            created_at: Utc::now(),
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn delete_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        let before = state.members.len();
        state.members.retain(|m| m.id != membership_id);
        if state.members.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_for_team(&self, team_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl TeamStore for MemStore {
    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, StoreError> {
        Ok(self.lock().teams.iter().find(|t| t.id == team_id).cloned())
    }

    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .teams
            .iter()
            .any(|t| t.id == team_id && t.created_by == user_id))
    }
}

#[async_trait::async_trait]
impl UserStore for MemStore {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }
}

#[async_trait::async_trait]
impl UsageStore for MemStore {
    async fn record_use(&self, params: &RecordUseParams) -> Result<(), StoreError> {
        if self.fail_usage.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("analytics table unavailable".to_string()));
        }
        let record = InviteUse {
            id: Uuid::new_v4(),
            invite_id: params.invite_id,
            user_id: params.user_id,
            team_id: params.team_id,
            is_new_signup: params.is_new_signup,
            created_at: Utc::now(),
        };
        self.lock().uses.push(record);
        Ok(())
    }

    async fn redemption_counts(
        &self,
        invite_ids: &[Uuid],
    ) -> Result<Vec<InviteUseCounts>, StoreError> {
        if self.fail_usage.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("analytics table unavailable".to_string()));
        }
        let state = self.lock();
        let mut counts = Vec::new();
        for &invite_id in invite_ids {
            let uses: Vec<&InviteUse> =
                state.uses.iter().filter(|u| u.invite_id == invite_id).collect();
            if uses.is_empty() {
                continue;
            }
            counts.push(InviteUseCounts {
                invite_id,
                redemptions: uses.len() as i64,
                new_signups: uses.iter().filter(|u| u.is_new_signup).count() as i64,
            });
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_membership_for_same_user_conflicts() {
        let store = MemStore::new();
        let user = store.add_user("ada");
        let owner = store.add_user("owner");
        let team_a = store.add_team("a", owner);
        let team_b = store.add_team("b", owner);

        store.insert_membership(team_a.id, user).await.unwrap();
        let err = store.insert_membership(team_b.id, user).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn decrement_stops_at_zero() {
        let store = MemStore::new();
        let invite = store
            .create_invite(&CreateInviteParams {
                team_id: Uuid::new_v4(),
                created_by: Uuid::new_v4(),
                code: "abc123defg".to_string(),
                uses_remaining: Some(1),
                expires_at: None,
            })
            .await
            .unwrap();

        assert!(store.decrement_uses(invite.id).await.unwrap());
        assert!(!store.decrement_uses(invite.id).await.unwrap());
        assert_eq!(store.invite_by_id(invite.id).unwrap().uses_remaining, Some(0));
    }

    #[tokio::test]
    async fn delete_invite_checks_creator() {
        let store = MemStore::new();
        let creator = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let invite = store
            .create_invite(&CreateInviteParams {
                team_id: Uuid::new_v4(),
                created_by: creator,
                code: "abc123defg".to_string(),
                uses_remaining: None,
                expires_at: None,
            })
            .await
            .unwrap();

        let err = store.delete_invite(invite.id, stranger).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
        store.delete_invite(invite.id, creator).await.unwrap();
        assert_eq!(store.invite_count(), 0);
    }
}
