use crate::config::TriageConfig;
use crate::storage::Pool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: TriageConfig,
}
