use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Environment variable that overrides the HTTP listen port.
pub const HTTP_PORT_ENV: &str = "HTTP_PORT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load_with_port(std::env::var(HTTP_PORT_ENV).ok())
    }

    /// Layered load with an explicit `HTTP_PORT` value. Empty counts as unset.
    fn load_with_port(port: Option<String>) -> Result<Self, AppError> {
        let port = port.filter(|value| !value.trim().is_empty());

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", port)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
