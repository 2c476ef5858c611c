use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, raw_pool},
};

/// Signing material for bearer tokens.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: Arc<str>,
    pub ttl_hours: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: JwtSettings,
}

impl AppState {
    pub fn new(orm: OrmConn, config: &AppConfig) -> Self {
        Self {
            pool: raw_pool(&orm),
            orm,
            jwt: JwtSettings {
                secret: Arc::from(config.jwt_secret.as_str()),
                ttl_hours: config.jwt_ttl_hours,
            },
        }
    }
}
