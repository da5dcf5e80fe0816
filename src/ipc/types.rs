use std::sync::Arc;

use serde::Deserialize;

use crate::service::RecordService;
use crate::workbench::Workbench;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub service: Arc<dyn RecordService>,
    pub workbench: Workbench,
}

impl AppState {
    pub fn new(service: Arc<dyn RecordService>) -> AppState {
        AppState {
            service,
            workbench: Workbench::new(),
        }
    }
}
