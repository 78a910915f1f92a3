//! Domain services: invite lifecycle, the join state machine, and the
//! best-effort redemption analytics.

mod code;
mod invites;
mod join;
mod usage;

pub use code::{INVITE_CODE_LEN, generate_invite_code};
pub use invites::{InviteError, InviteListing, InviteService};
pub use join::{JoinError, JoinService};
pub use usage::UsageLogger;
