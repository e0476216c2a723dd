use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;
use tracing::info;

use crate::models::{
    NewPizza, NewRestaurant, NewRestaurantPizza, Pizza, Restaurant, RestaurantPizza, PRICE_RANGE,
};
use crate::schema::{pizzas, restaurant_pizzas, restaurants};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,
    #[error(
        "Price {0} is outside {min}..={max}",
        min = PRICE_RANGE.start(),
        max = PRICE_RANGE.end()
    )]
    PriceOutOfRange(f64),
    #[error("Pizza {0} does not exist")]
    UnknownPizza(i32),
    #[error("Restaurant {0} does not exist")]
    UnknownRestaurant(i32),
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// Whether the failure was caused by the data the caller submitted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::PriceOutOfRange(_)
                | StoreError::UnknownPizza(_)
                | StoreError::UnknownRestaurant(_)
                | StoreError::ConstraintViolation(_)
        )
    }
}

/// Association fields that passed the presence check, not yet range or
/// reference checked. `price` is whatever JSON number the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantPizzaDraft {
    pub price: f64,
    pub pizza_id: i32,
    pub restaurant_id: i32,
}

pub fn list_restaurants(conn: &mut SqliteConnection) -> Result<Vec<Restaurant>, StoreError> {
    Ok(restaurants::table
        .order(restaurants::id)
        .select(Restaurant::as_select())
        .load(conn)?)
}

pub fn list_pizzas(conn: &mut SqliteConnection) -> Result<Vec<Pizza>, StoreError> {
    Ok(pizzas::table
        .order(pizzas::id)
        .select(Pizza::as_select())
        .load(conn)?)
}

pub fn list_restaurant_pizzas(
    conn: &mut SqliteConnection,
) -> Result<Vec<RestaurantPizza>, StoreError> {
    Ok(restaurant_pizzas::table
        .order(restaurant_pizzas::id)
        .select(RestaurantPizza::as_select())
        .load(conn)?)
}

pub fn find_restaurant(
    conn: &mut SqliteConnection,
    restaurant_id: i32,
) -> Result<(Restaurant, Vec<(RestaurantPizza, Pizza)>), StoreError> {
    conn.transaction(|conn| {
        let restaurant = restaurants::table
            .find(restaurant_id)
            .select(Restaurant::as_select())
            .first(conn)
            .optional()?
            .ok_or(StoreError::NotFound)?;

        let offers = RestaurantPizza::belonging_to(&restaurant)
            .inner_join(pizzas::table)
            .order(restaurant_pizzas::id)
            .select((RestaurantPizza::as_select(), Pizza::as_select()))
            .load(conn)?;

        Ok((restaurant, offers))
    })
}

/// Removes the restaurant and every association pointing at it. Returns the
/// number of associations removed along with it.
pub fn delete_restaurant(
    conn: &mut SqliteConnection,
    restaurant_id: i32,
) -> Result<usize, StoreError> {
    conn.transaction(|conn| {
        let removed_offers = diesel::delete(
            restaurant_pizzas::table.filter(restaurant_pizzas::restaurant_id.eq(restaurant_id)),
        )
        .execute(conn)?;

        let removed = diesel::delete(restaurants::table.find(restaurant_id)).execute(conn)?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }

        info!(restaurant_id, removed_offers, "deleted restaurant");
        Ok(removed_offers)
    })
}

pub fn create_restaurant_pizza(
    conn: &mut SqliteConnection,
    draft: &RestaurantPizzaDraft,
) -> Result<(RestaurantPizza, Pizza, Restaurant), StoreError> {
    let price = whole_price(draft.price).ok_or(StoreError::PriceOutOfRange(draft.price))?;

    conn.transaction(|conn| {
        let pizza = pizzas::table
            .find(draft.pizza_id)
            .select(Pizza::as_select())
            .first(conn)
            .optional()?
            .ok_or(StoreError::UnknownPizza(draft.pizza_id))?;
        let restaurant = restaurants::table
            .find(draft.restaurant_id)
            .select(Restaurant::as_select())
            .first(conn)
            .optional()?
            .ok_or(StoreError::UnknownRestaurant(draft.restaurant_id))?;

        let created = diesel::insert_into(restaurant_pizzas::table)
            .values(NewRestaurantPizza {
                price,
                pizza_id: pizza.id,
                restaurant_id: restaurant.id,
            })
            .returning(RestaurantPizza::as_returning())
            .get_result(conn)
            .map_err(constraint_violation)?;

        info!(
            id = created.id,
            restaurant_id = created.restaurant_id,
            pizza_id = created.pizza_id,
            price = created.price,
            "created restaurant pizza"
        );
        Ok((created, pizza, restaurant))
    })
}

/// Accepts `10` and `10.0` alike; fractional or out of range prices give `None`.
fn whole_price(price: f64) -> Option<i32> {
    if price.fract() != 0.0 {
        return None;
    }
    // `as` saturates, so huge values land outside the range.
    Some(price as i32).filter(|price| PRICE_RANGE.contains(price))
}

fn constraint_violation(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(
            kind @ (DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation),
            info,
        ) => StoreError::ConstraintViolation(format!("{kind:?}: {}", info.message())),
        err => StoreError::Database(err),
    }
}

const SAMPLE_RESTAURANTS: &[(&str, &str)] = &[
    ("Karen's Pizza Shack", "address1"),
    ("Sanjay's Pizza", "address2"),
    ("Kiki's Pizza", "address3"),
];

const SAMPLE_PIZZAS: &[(&str, &str)] = &[
    ("Emma", "Dough, Tomato Sauce, Cheese"),
    ("Geri", "Dough, Tomato Sauce, Cheese, Pepperoni"),
    ("Melanie", "Dough, Sauce, Ricotta, Red peppers, Mustard"),
];

// (restaurant index, pizza index, price)
const SAMPLE_OFFERS: &[(usize, usize, i32)] = &[(0, 0, 10), (0, 1, 12), (1, 2, 15)];

/// Replaces every row with the sample restaurants, pizzas and prices.
pub fn seed(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.transaction(|conn| {
        diesel::delete(restaurant_pizzas::table).execute(conn)?;
        diesel::delete(restaurants::table).execute(conn)?;
        diesel::delete(pizzas::table).execute(conn)?;

        let restaurant_ids = SAMPLE_RESTAURANTS
            .iter()
            .map(|&(name, address)| {
                diesel::insert_into(restaurants::table)
                    .values(NewRestaurant { name, address })
                    .returning(restaurants::id)
                    .get_result::<i32>(conn)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pizza_ids = SAMPLE_PIZZAS
            .iter()
            .map(|&(name, ingredients)| {
                diesel::insert_into(pizzas::table)
                    .values(NewPizza { name, ingredients })
                    .returning(pizzas::id)
                    .get_result::<i32>(conn)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for &(restaurant, pizza, price) in SAMPLE_OFFERS {
            diesel::insert_into(restaurant_pizzas::table)
                .values(NewRestaurantPizza {
                    price,
                    pizza_id: pizza_ids[pizza],
                    restaurant_id: restaurant_ids[restaurant],
                })
                .execute(conn)?;
        }

        info!(
            restaurants = restaurant_ids.len(),
            pizzas = pizza_ids.len(),
            offers = SAMPLE_OFFERS.len(),
            "seeded database"
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_pool;

    fn draft(price: f64, pizza_id: i32, restaurant_id: i32) -> RestaurantPizzaDraft {
        RestaurantPizzaDraft {
            price,
            pizza_id,
            restaurant_id,
        }
    }

    #[test]
    fn test_listings_are_ordered_by_id() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        let restaurants = list_restaurants(conn).unwrap();
        assert_eq!(
            restaurants.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(restaurants[0].name, "Karen's Pizza Shack");

        let pizzas = list_pizzas(conn).unwrap();
        assert_eq!(pizzas.len(), 3);
        assert_eq!(pizzas[2].name, "Melanie");
    }

    #[test]
    fn test_find_restaurant_loads_offers_with_pizzas() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        let (restaurant, offers) = find_restaurant(conn, 1).unwrap();
        assert_eq!(restaurant.address, "address1");
        assert_eq!(offers.len(), 2);
        assert!(offers.iter().all(|(offer, pizza)| offer.restaurant_id == 1
            && offer.pizza_id == pizza.id));

        let (_, offers) = find_restaurant(conn, 3).unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_find_missing_restaurant() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        assert!(matches!(find_restaurant(conn, 42), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_delete_restaurant_cascades_to_offers() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        assert_eq!(delete_restaurant(conn, 1).unwrap(), 2);
        assert!(matches!(find_restaurant(conn, 1), Err(StoreError::NotFound)));
        assert!(list_restaurant_pizzas(conn)
            .unwrap()
            .iter()
            .all(|offer| offer.restaurant_id != 1));
        // Pizzas are left alone.
        assert_eq!(list_pizzas(conn).unwrap().len(), 3);

        assert!(matches!(delete_restaurant(conn, 1), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_create_restaurant_pizza() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        let (created, pizza, restaurant) =
            create_restaurant_pizza(conn, &draft(30.0, 3, 3)).unwrap();
        assert_eq!(created.price, 30);
        assert_eq!(pizza.name, "Melanie");
        assert_eq!(restaurant.name, "Kiki's Pizza");

        let (_, offers) = find_restaurant(conn, 3).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].0, created);
    }

    #[test]
    fn test_create_restaurant_pizza_at_lowest_price() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        let (created, _, _) = create_restaurant_pizza(conn, &draft(1.0, 1, 2)).unwrap();
        assert_eq!(created.price, 1);
        assert_eq!(created.restaurant_id, 2);
    }

    #[test]
    fn test_whole_price() {
        assert_eq!(whole_price(1.0), Some(1));
        assert_eq!(whole_price(30.0), Some(30));
        assert_eq!(whole_price(12.0), Some(12));
        assert_eq!(whole_price(12.25), None);
        assert_eq!(whole_price(0.0), None);
        assert_eq!(whole_price(1e20), None);
    }

    #[test]
    fn test_create_restaurant_pizza_rejects_invalid_input() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        for (input, expected) in [
            (draft(0.0, 1, 1), "price"),
            (draft(31.0, 1, 1), "price"),
            (draft(10.5, 1, 1), "price"),
            (draft(-5.0, 1, 1), "price"),
            (draft(f64::from(i32::MAX) + 1.0, 1, 1), "price"),
            (draft(10.0, 99, 1), "pizza"),
            (draft(10.0, 1, 99), "restaurant"),
        ] {
            let err = create_restaurant_pizza(conn, &input).unwrap_err();
            assert!(err.is_validation(), "{input:?} gave {err}");
            match expected {
                "price" => assert!(matches!(err, StoreError::PriceOutOfRange(_))),
                "pizza" => assert!(matches!(err, StoreError::UnknownPizza(99))),
                _ => assert!(matches!(err, StoreError::UnknownRestaurant(99))),
            }
        }

        assert_eq!(list_restaurant_pizzas(conn).unwrap().len(), SAMPLE_OFFERS.len());
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let pool = seeded_pool();
        let conn = &mut pool.get().unwrap();

        let result = diesel::insert_into(restaurant_pizzas::table)
            .values(NewRestaurantPizza {
                price: 5,
                pizza_id: 99,
                restaurant_id: 1,
            })
            .execute(conn)
            .map_err(constraint_violation);

        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }
}
