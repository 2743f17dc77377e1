use crate::database::Database;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}
