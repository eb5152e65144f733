use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub cookie_secure: bool,
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/udhaar".to_string(),
            jwt_secret: "test-secret".to_string(),
            cookie_secure: false,
            cors_allowed_origins: None,
        }
    }

    #[test]
    fn config_is_cloneable_for_state() {
        let config = base_config();
        let cloned = config.clone();
        assert_eq!(cloned.server_port, 3000);
        assert_eq!(cloned.database_url, config.database_url);
    }
}
