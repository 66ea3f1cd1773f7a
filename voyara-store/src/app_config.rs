use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that stays out of git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VOYARA)
            // Eg. `VOYARA__SERVER__PORT=8080` would set `server.port`
            .add_source(config::Environment::with_prefix("VOYARA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
