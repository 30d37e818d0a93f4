//! Server configuration from environment variables.

use crate::query::{Direction, SortBy};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";
pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid listing defaults: {0}")]
    InvalidListing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// In-process store; data is lost on restart.
    Memory,
}

/// Defaults applied to `GET /api/recipes` when the client omits a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingDefaults {
    pub sort_by: SortBy,
    pub order: Direction,
    pub page_size: i64,
    /// Larger requested page sizes are clamped to this.
    pub max_page_size: i64,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            sort_by: SortBy::CreatedAt,
            order: Direction::Desc,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl ListingDefaults {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_page_size < 1 {
            return Err(ConfigError::InvalidListing(format!(
                "max page size must be at least 1, got {}",
                self.max_page_size
            )));
        }
        if self.page_size < 1 || self.page_size > self.max_page_size {
            return Err(ConfigError::InvalidListing(format!(
                "page size must be between 1 and {}, got {}",
                self.max_page_size, self.page_size
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    /// Origin allowed by CORS.
    pub client_url: String,
    pub listing: ListingDefaults,
    pub session_ttl_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
    /// - `DATABASE_URL`: required when the backend is postgres
    /// - `PORT`: listen port (default: 5000)
    /// - `CLIENT_URL`: CORS origin (default: http://localhost:3000)
    /// - `POTLUCK_PAGE_SIZE`: default recipes per page (default: 12)
    /// - `POTLUCK_MAX_PAGE_SIZE`: largest allowed page (default: 100)
    /// - `SESSION_TTL_DAYS`: login session lifetime (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "STORE_BACKEND".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let client_url = lookup("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());

        let listing = ListingDefaults {
            page_size: parse_or(&lookup, "POTLUCK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: parse_or(&lookup, "POTLUCK_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?,
            ..ListingDefaults::default()
        }
        .validate()?;

        let session_ttl_days = parse_or(&lookup, "SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        if session_ttl_days < 1 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_DAYS".to_string(),
                value: session_ttl_days.to_string(),
            });
        }

        Ok(Self {
            store,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            client_url,
            listing,
            session_ttl_days,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
