use std::sync::Arc;

use crate::config::AppConfig;
use crate::goals::repository::OkrRepository;
use crate::goals::service::OkrService;

pub struct AppState {
    pub okr: OkrService,
    pub jwt_secret: Option<String>,
}

impl AppState {
    pub fn new(repo: Arc<dyn OkrRepository>, config: &AppConfig) -> Self {
        Self {
            okr: OkrService::with_max_depth(repo, config.max_hierarchy_depth),
            jwt_secret: config.auth.jwt_secret.clone(),
        }
    }
}
