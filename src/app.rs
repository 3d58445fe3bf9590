use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{index_handler, log_handler};

pub struct App;

impl App {
    pub fn new() -> Self {
        Self
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/log", post(log_handler))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
