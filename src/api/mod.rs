pub mod routes;
mod state;

pub use state::AppState;

// Re-export route handlers for convenience
pub use routes::addresses;
pub use routes::tasks;
