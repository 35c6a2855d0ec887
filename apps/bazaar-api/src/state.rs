//! Shared handler state.

use std::sync::Arc;

use bazaar_db::Database;

use crate::config::ApiConfig;
use crate::service::CheckoutService;

/// State cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.db.clone())
    }
}
