use std::sync::Arc;

use shared_config::AppConfig;

use crate::workbooks::Workbooks;

/// Router state shared by every cell.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub workbooks: Workbooks,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let workbooks = Workbooks::from_config(&config);
        Self::with_workbooks(config, workbooks)
    }

    pub fn with_workbooks(config: AppConfig, workbooks: Workbooks) -> Self {
        Self {
            config: Arc::new(config),
            workbooks,
        }
    }
}
