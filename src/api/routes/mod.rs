use std::collections::HashMap;

use axum::http::StatusCode;
use log::{error, warn};

use crate::database::Database;
use crate::query::ListRequest;

pub mod addresses;
pub mod tasks;

/// Turns raw query-string parameters into a list request, or a 400 describing the bad one.
pub(crate) fn parse_list_request(
    params: HashMap<String, String>,
) -> Result<ListRequest, (StatusCode, String)> {
    ListRequest::from_params(params).map_err(|e| {
        warn!("Rejected list request: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })
}

/// Runs blocking database work off the async runtime. If the worker itself dies the
/// error is logged and `fallback` is returned, so reads stay fail-soft.
pub(crate) async fn with_db<T, F>(db: Database, fallback: T, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&Database) -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&db)).await {
        Ok(value) => value,
        Err(e) => {
            error!("Database worker failed: {}", e);
            fallback
        }
    }
}
