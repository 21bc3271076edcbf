use crate::{config::AppConfig, db::DbPool, services::rides::RideService};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub rides: RideService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        Self {
            config,
            rides: RideService::new(db),
        }
    }
}
