use std::sync::Arc;

use services::{InviteService, JoinService};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub invites: Arc<InviteService>,
    pub join: Arc<JoinService>,
}
