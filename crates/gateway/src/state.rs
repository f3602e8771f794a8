use std::sync::Arc;
use std::time::Instant;

use sr_domain::config::Config;
use sr_session::SessionClient;

use crate::dispatch::EventDispatcher;

/// Shared application state passed to all API handlers.
///
/// Built once by [`crate::bootstrap::build_app_state`]; the session client
/// inside lives as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<SessionClient>,
    pub dispatcher: Arc<EventDispatcher>,
    pub started_at: Instant,
}
