use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::services::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let auth = Arc::new(AuthService::new(config.jwt_secret.clone()));
        Self {
            db,
            config: Arc::new(config),
            auth,
        }
    }
}
