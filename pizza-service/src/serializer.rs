use crate::models;
use crate::payloads::{
    CreatedRestaurantPizza, PizzaSummary, RestaurantDetail, RestaurantPizzaWithPizza,
    RestaurantSummary,
};

pub fn serialize_restaurant(restaurant: models::Restaurant) -> RestaurantSummary {
    RestaurantSummary {
        id: restaurant.id,
        name: restaurant.name,
        address: restaurant.address,
    }
}

pub fn serialize_pizza(pizza: models::Pizza) -> PizzaSummary {
    PizzaSummary {
        id: pizza.id,
        name: pizza.name,
        ingredients: pizza.ingredients,
    }
}

pub fn serialize_restaurant_detail(
    restaurant: models::Restaurant,
    offers: Vec<(models::RestaurantPizza, models::Pizza)>,
) -> RestaurantDetail {
    RestaurantDetail {
        id: restaurant.id,
        name: restaurant.name,
        address: restaurant.address,
        restaurant_pizzas: offers
            .into_iter()
            .map(|(offer, pizza)| RestaurantPizzaWithPizza {
                id: offer.id,
                price: offer.price,
                pizza_id: offer.pizza_id,
                restaurant_id: offer.restaurant_id,
                pizza: serialize_pizza(pizza),
            })
            .collect(),
    }
}

pub fn serialize_created_restaurant_pizza(
    offer: models::RestaurantPizza,
    pizza: models::Pizza,
    restaurant: models::Restaurant,
) -> CreatedRestaurantPizza {
    CreatedRestaurantPizza {
        id: offer.id,
        price: offer.price,
        pizza_id: offer.pizza_id,
        restaurant_id: offer.restaurant_id,
        pizza: serialize_pizza(pizza),
        restaurant: serialize_restaurant(restaurant),
    }
}
