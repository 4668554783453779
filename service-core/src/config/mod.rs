//! Base configuration shared by every service in the workspace.
//!
//! Values come from an optional local `configuration` file, overridden by
//! `APP__`-prefixed environment variables. Service-specific settings layer
//! on top through their own environment lookups.

use crate::error::AppError;
use config::{Config as Loader, Environment, File};
use serde::Deserialize;

/// Settings every service needs regardless of its domain.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TCP port the HTTP listener binds.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load base settings. A `.env` file is honored when present so local
    /// runs do not need exported variables.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let loaded = Loader::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(loaded.try_deserialize()?)
    }
}
