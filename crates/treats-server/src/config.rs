use anyhow::{Result, bail};

/// Secrets that ship in sample `.env` files and must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["", "dev-secret-change-me", "changeme", "change-me", "secret"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub session_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("TREATS_JWT_SECRET").unwrap_or_default();
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.trim()) {
            bail!("TREATS_JWT_SECRET must be set to a real secret");
        }

        let port: u16 = get("TREATS_PORT").unwrap_or_else(|| "2239".into()).parse()?;
        let session_days: i64 = get("TREATS_SESSION_DAYS").unwrap_or_else(|| "30".into()).parse()?;
        if session_days <= 0 {
            bail!("TREATS_SESSION_DAYS must be positive");
        }

        Ok(Self {
            host: get("TREATS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("TREATS_DB_PATH").unwrap_or_else(|| "treats.db".into()),
            jwt_secret,
            session_days,
        })
    }
}
