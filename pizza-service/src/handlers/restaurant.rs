use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::payloads::*;
use crate::serializer::{serialize_restaurant, serialize_restaurant_detail};
use crate::store::{self, StoreError};

use super::AppState;

const RESTAURANT_NOT_FOUND: &str = "Restaurant not found";

/// Stored ids are `i32`; any other path segment cannot name a restaurant.
fn parse_restaurant_id(id: &str) -> Result<i32, ApiError> {
    id.parse().map_err(|_| ApiError::NotFound(RESTAURANT_NOT_FOUND))
}

fn restaurant_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::NotFound(RESTAURANT_NOT_FOUND),
        err => err.into(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants))
        .route(
            "/restaurants/{id}",
            get(get_restaurant).delete(delete_restaurant),
        )
}

#[utoipa::path(
    get,
    path = "/restaurants",
    responses(
        (status = 200, description = "List of restaurants", body = Vec<RestaurantSummary>),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<RestaurantSummary>>, ApiError> {
    let restaurants = state.with_conn(store::list_restaurants).await?;

    Ok(Json(
        restaurants.into_iter().map(serialize_restaurant).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    responses(
        (status = 200, description = "Restaurant with the pizzas it offers", body = RestaurantDetail),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<RestaurantDetail>, ApiError> {
    let restaurant_id = parse_restaurant_id(&restaurant_id)?;
    let (restaurant, offers) = state
        .with_conn(move |conn| store::find_restaurant(conn, restaurant_id))
        .await
        .map_err(restaurant_not_found)?;

    Ok(Json(serialize_restaurant_detail(restaurant, offers)))
}

#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    responses(
        (status = 204, description = "Restaurant and its pizza offers deleted"),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let restaurant_id = parse_restaurant_id(&restaurant_id)?;
    state
        .with_conn(move |conn| store::delete_restaurant(conn, restaurant_id))
        .await
        .map_err(restaurant_not_found)?;

    Ok(StatusCode::NO_CONTENT)
}
