use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::{parse_list_request, with_db};
use crate::api::AppState;
use crate::query::Page;
use crate::tasks::{PriorityCount, StatusCount, Task};

/// GET /api/tasks?page&per_page&sort&operator&title&status&priority&from&to
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Task>>, (StatusCode, String)> {
    let request = parse_list_request(params)?;

    let page = with_db(state.db, Page::empty(), move |db| Task::list(db, &request)).await;

    Ok(Json(page))
}

/// GET /api/tasks/status-counts
pub async fn get_status_counts(State(state): State<AppState>) -> Json<Vec<StatusCount>> {
    Json(with_db(state.db, Vec::new(), Task::counts_by_status).await)
}

/// GET /api/tasks/priority-counts
pub async fn get_priority_counts(State(state): State<AppState>) -> Json<Vec<PriorityCount>> {
    Json(with_db(state.db, Vec::new(), Task::counts_by_priority).await)
}
