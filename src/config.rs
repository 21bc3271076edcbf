use std::{env, net::SocketAddr};

use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rides.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        Ok(Self {
            database_url,
            listen_addr,
        })
    }
}

/// Settings for the polling client binaries.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let raw = env::var("RIDES_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let api_url = Url::parse(&raw)
            .map_err(|err| AppError::Config(format!("invalid RIDES_API_URL: {err}")))?;
        Ok(Self { api_url })
    }
}
