use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JoinRequest {
    pub invite_code: String,
    /// Set by the client after the user explicitly approves leaving
    /// their current team.
    #[serde(default)]
    pub confirm_switch: bool,
    /// True when the redemption happens right after registration, so
    /// the analytics record can distinguish acquisition from switching.
    #[serde(default)]
    pub is_new_signup: bool,
}

/// Every terminal branch of the join protocol. Rejections here are not
/// errors: the client renders a distinct screen for each and may
/// re-invoke with confirmation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum JoinOutcome {
    Joined {
        team_id: Uuid,
        team_name: String,
    },
    AlreadyMember {
        team_id: Uuid,
    },
    RequiresConfirmation {
        current_team_id: Uuid,
        current_team_name: Option<String>,
    },
    OwnerCannotSwitch {
        owned_team_id: Uuid,
    },
}

/// Public invite details rendered on the join page before the caller
/// authenticates or commits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvitePreview {
    pub code: String,
    pub team_id: Uuid,
    pub team_name: String,
    pub member_count: i64,
    pub inviter_name: Option<String>,
}
