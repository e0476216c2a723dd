use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::payloads::*;
use crate::serializer::serialize_created_restaurant_pizza;
use crate::store;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/restaurant_pizzas", post(create_restaurant_pizza))
}

#[utoipa::path(
    post,
    path = "/restaurant_pizzas",
    request_body = CreateRestaurantPizzaRequest,
    responses(
        (status = 201, description = "Pizza offer created", body = CreatedRestaurantPizza),
        (status = 400, description = "Missing field, price out of range or unknown pizza/restaurant", body = ValidationErrorResponse),
    ),
    tag = "restaurant_pizzas"
)]
#[instrument(skip(state))]
pub async fn create_restaurant_pizza(
    State(state): State<AppState>,
    payload: Result<Json<CreateRestaurantPizzaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedRestaurantPizza>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(%rejection, "rejected request body");
        ApiError::validation()
    })?;
    let draft = payload.into_draft().ok_or_else(|| {
        warn!("missing required fields");
        ApiError::validation()
    })?;

    let (offer, pizza, restaurant) = state
        .with_conn(move |conn| store::create_restaurant_pizza(conn, &draft))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serialize_created_restaurant_pizza(offer, pizza, restaurant)),
    ))
}
