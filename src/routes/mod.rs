use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod stores;
pub mod users;

/// Every `/api` route group; state is attached by `app::build_router`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(stores::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(cart::router())
        .merge(orders::router())
}
