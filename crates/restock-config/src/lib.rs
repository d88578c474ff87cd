//! restock-config
//!
//! Environment-driven settings for the auto-replenishment service.
//!
//! # Contract
//! - All settings come from env vars; `.env` loading (dotenvy) is the
//!   binary's job, not this crate's.
//! - Values are quote-stripped: container runtimes and `.env` files often
//!   hand values through with their surrounding quotes intact.
//! - Error messages reference the env var NAME, never the value — the API
//!   token must not leak into logs.
//! - `Settings::from_lookup` takes the lookup function so tests never touch
//!   the process environment.

use anyhow::{bail, Context, Result};

pub const ENV_API_BASE: &str = "RESTOCK_API_BASE";
pub const ENV_API_TOKEN: &str = "RESTOCK_API_TOKEN";
pub const ENV_STORE_NAME: &str = "STORE_NAME";
pub const ENV_RECIPE_FIELD_NAME: &str = "RECIPE_FIELD_NAME";
pub const ENV_MIN_STOCK_THRESHOLD: &str = "MIN_STOCK_THRESHOLD";
pub const ENV_SERVER_HOST: &str = "SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "SERVER_PORT";
pub const ENV_MAX_CONCURRENT_POSITIONS: &str = "MAX_CONCURRENT_POSITIONS";

/// Runtime settings. Construct via [`Settings::from_env`].
#[derive(Clone)]
pub struct Settings {
    /// Base URL of the remote inventory API, without a trailing slash.
    pub api_base: String,
    /// Bearer credential for the remote inventory API. Redacted in Debug.
    pub api_token: String,
    /// Name of the monitored warehouse store.
    pub store_name: String,
    /// Name of the product custom attribute that links to a recipe.
    pub recipe_field_name: String,
    /// Available quantity below which auto-production is considered.
    pub min_stock_threshold: f64,
    pub server_host: String,
    pub server_port: u16,
    /// Width of the per-position worker pool; 1 = strictly sequential.
    pub max_concurrent_positions: usize,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_base", &self.api_base)
            .field("api_token", &"<redacted>")
            .field("store_name", &self.store_name)
            .field("recipe_field_name", &self.recipe_field_name)
            .field("min_stock_threshold", &self.min_stock_threshold)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("max_concurrent_positions", &self.max_concurrent_positions)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key).map(|v| strip_quotes(&v)) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => bail!("{key} is required"),
            }
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| strip_quotes(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_base = required(ENV_API_BASE)?.trim_end_matches('/').to_string();
        let api_token = required(ENV_API_TOKEN)?;
        let store_name = required(ENV_STORE_NAME)?;
        let recipe_field_name = optional(ENV_RECIPE_FIELD_NAME, "Recipe");

        let min_stock_threshold = parse_or(&lookup, ENV_MIN_STOCK_THRESHOLD, 2.0)?;
        let server_host = optional(ENV_SERVER_HOST, "0.0.0.0");
        let server_port: u16 = parse_or(&lookup, ENV_SERVER_PORT, 8080)?;
        let max_concurrent_positions: usize =
            parse_or(&lookup, ENV_MAX_CONCURRENT_POSITIONS, 1)?;
        if max_concurrent_positions == 0 {
            bail!("{ENV_MAX_CONCURRENT_POSITIONS} must be at least 1");
        }

        Ok(Self {
            api_base,
            api_token,
            store_name,
            recipe_field_name,
            min_stock_threshold,
            server_host,
            server_port,
            max_concurrent_positions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).map(|v| strip_quotes(&v)).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an unparseable value")),
        None => Ok(default),
    }
}

/// Remove one layer of matching surrounding quotes (single or double).
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}
