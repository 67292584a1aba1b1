//! Application state

use std::sync::Arc;

use partnerhub_billing::BillingService;

use crate::{
    auth::{AuthState, JwtManager},
    config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt_manager: JwtManager,
    pub billing: Arc<BillingService>,
}

impl AppState {
    pub fn new(config: Config, billing: BillingService) -> Self {
        let jwt_manager = JwtManager::new(&config.jwt_secret);

        Self {
            config,
            jwt_manager,
            billing: Arc::new(billing),
        }
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt_manager: self.jwt_manager.clone(),
        }
    }
}
