use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub join_code_length: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let join_code_length = env_map
            .get("JOIN_CODE_LENGTH")
            .map(|s| s.as_str())
            .unwrap_or("6")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "JOIN_CODE_LENGTH".to_string(),
                    "must be a valid usize".to_string(),
                )
            })?;
        if !(4..=12).contains(&join_code_length) {
            return Err(ConfigError::InvalidValue(
                "JOIN_CODE_LENGTH".to_string(),
                format!("must be between 4 and 12, got {}", join_code_length),
            ));
        }

        Ok(Config {
            port,
            database_path,
            join_code_length,
        })
    }
}
