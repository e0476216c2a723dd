use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::RestaurantPizzaDraft;

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantSummary {
    /// Unique identifier for the restaurant
    pub id: i32,
    /// Name of the restaurant
    pub name: String,
    /// Address of the restaurant
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PizzaSummary {
    /// Unique identifier for the pizza
    pub id: i32,
    /// Name of the pizza
    pub name: String,
    /// Comma separated ingredient list
    pub ingredients: String,
}

/// A restaurant together with every pizza it offers.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDetail {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub restaurant_pizzas: Vec<RestaurantPizzaWithPizza>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantPizzaWithPizza {
    pub id: i32,
    /// Price the restaurant charges for the pizza
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: PizzaSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedRestaurantPizza {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: PizzaSummary,
    pub restaurant: RestaurantSummary,
}

/// Every field is optional here so that a missing one is reported as a
/// validation error instead of a body rejection.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateRestaurantPizzaRequest {
    /// Whole price between 1 and 30; `10` and `10.0` are both accepted
    pub price: Option<f64>,
    /// Identifier of an existing pizza
    pub pizza_id: Option<i32>,
    /// Identifier of an existing restaurant
    pub restaurant_id: Option<i32>,
}

impl CreateRestaurantPizzaRequest {
    /// Returns the draft when all required fields are present.
    pub fn into_draft(self) -> Option<RestaurantPizzaDraft> {
        Some(RestaurantPizzaDraft {
            price: self.price?,
            pizza_id: self.pizza_id?,
            restaurant_id: self.restaurant_id?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Validation failures
    pub errors: Vec<String>,
}
