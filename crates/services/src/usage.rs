use std::sync::Arc;

use db::{RecordUseParams, UsageStore};
use uuid::Uuid;

/// Best-effort analytics writer for invite redemptions.
///
/// Holds the elevated-credential store; the acting user does not own
/// the analytics table. A failed write is logged and dropped; it never
/// delays or fails the join response, and it is not retried.
#[derive(Clone)]
pub struct UsageLogger {
    store: Arc<dyn UsageStore>,
}

impl UsageLogger {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    pub fn record(&self, invite_id: Uuid, user_id: Uuid, team_id: Uuid, is_new_signup: bool) {
        let store = self.store.clone();
        tokio::spawn(async move {
            let params = RecordUseParams {
                invite_id,
                user_id,
                team_id,
                is_new_signup,
            };
            if let Err(error) = store.record_use(&params).await {
                tracing::warn!(%invite_id, %user_id, %error, "failed to record invite redemption");
            }
        });
    }
}
