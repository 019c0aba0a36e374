//! HTTP API and display hosting for FinMate

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(runtime: RuntimeManager) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }
}
