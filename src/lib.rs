//! Two-sided marketplace backend: shoppers keep a cart and check out into
//! orders, stores maintain products and categories. HTTP JSON over axum,
//! PostgreSQL through SeaORM.

pub mod app;
pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
