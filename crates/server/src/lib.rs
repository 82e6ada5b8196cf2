//! HTTP surface for the register service.
//!
//! Three routes: a health line at `/`, the batch endpoint at
//! `/receive-data`, and a template download at `/download-latest`.
//! Spreadsheet and storage work is synchronous, so handlers push it
//! onto the blocking pool.

use std::sync::Arc;

use kassa_config::Settings;

pub mod handlers;
pub mod routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}
