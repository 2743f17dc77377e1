use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::{parse_list_request, with_db};
use crate::addresses::DeliveryAddress;
use crate::api::AppState;
use crate::query::Page;

/// GET /api/addresses?page&per_page&sort&operator&country&city&zipCode
pub async fn list_addresses(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<DeliveryAddress>>, (StatusCode, String)> {
    let request = parse_list_request(params)?;

    let page = with_db(state.db, Page::empty(), move |db| {
        DeliveryAddress::list(db, &request)
    })
    .await;

    Ok(Json(page))
}
