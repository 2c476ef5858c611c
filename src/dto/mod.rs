pub mod auth;
pub mod cart;
pub mod categories;
pub mod feedback;
pub mod orders;
pub mod products;
pub mod stores;
pub mod users;
