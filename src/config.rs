// config.rs
use thiserror::Error;
use uuid::Uuid;

use crate::service::escrow_service::PayoutBasis;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    /// Identity credited with platform fees at settlement.
    pub platform_account: Uuid,
    pub payout_basis: PayoutBasis,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://gigledger.db?mode=rwc".to_string());

        let jwt_secret = lookup("JWT_SECRET_KEY")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let jwt_maxage = match lookup("JWT_MAXAGE") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                key: "JWT_MAXAGE",
                reason: e.to_string(),
            })?,
            None => 60,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => 8000,
        };

        let platform_account = match lookup("PLATFORM_ACCOUNT_ID") {
            Some(raw) => Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid {
                key: "PLATFORM_ACCOUNT_ID",
                reason: e.to_string(),
            })?,
            None => Uuid::nil(),
        };

        let payout_basis = match lookup("PAYOUT_BASIS") {
            Some(raw) => raw
                .parse::<PayoutBasis>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "PAYOUT_BASIS",
                    reason,
                })?,
            None => PayoutBasis::default(),
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            platform_account,
            payout_basis,
            allowed_origins,
        })
    }
}
