use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Invite as stored in the database. The `code` is the public lookup
/// key embedded in shareable URLs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct Invite {
    pub id: Uuid,
    pub team_id: Uuid,
    pub created_by: Uuid,
    pub code: String,
    /// `None` means unlimited redemptions.
    pub uses_remaining: Option<i32>,
    /// `None` means the invite never expires. Expiration is filtered at
    /// read time; rows are never rewritten to an expired state.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        match self.uses_remaining {
            Some(remaining) => remaining <= 0,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateInviteRequest {
    pub team_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_remaining: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateInviteResponse {
    pub invite: Invite,
    /// Fully-qualified URL embedding the invite code.
    pub share_url: String,
}

/// Per-invite redemption counters derived from the analytics table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InviteUseStats {
    pub redemptions: i64,
    pub new_signups: i64,
}

/// Invite enriched with best-effort redemption stats. `stats` is `None`
/// when the analytics read failed; the listing itself still succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InviteWithStats {
    pub invite: Invite,
    pub share_url: String,
    pub stats: Option<InviteUseStats>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn invite(uses_remaining: Option<i32>, expires_at: Option<DateTime<Utc>>) -> Invite {
        Invite {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            code: "abc123defg".to_string(),
            uses_remaining,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unlimited_invite_never_expires_or_exhausts() {
        let inv = invite(None, None);
        assert!(!inv.is_expired(Utc::now()));
        assert!(!inv.is_exhausted());
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = Utc::now();
        let inv = invite(Some(5), Some(now - Duration::hours(1)));
        assert!(inv.is_expired(now));
        assert!(!inv.is_exhausted());
    }

    #[test]
    fn zero_uses_is_exhausted() {
        let inv = invite(Some(0), None);
        assert!(inv.is_exhausted());
        let inv = invite(Some(1), None);
        assert!(!inv.is_exhausted());
    }
}
