// Application state for HTTP handlers
use crate::application::panel_runner::PanelRunner;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<PanelRunner>,
}
