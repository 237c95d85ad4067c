//! Provider configuration.
//!
//! The host hands the provider an untyped configuration object. It is read
//! once into [`ProviderConfig`]; missing values fall back to the environment.
//!
//! # Environment Variables
//!
//! - `CUSTOM_API_URL`: base URL of the API, used when `api_url` is not set
//! - `CUSTOM_API_KEY`: API key, used when `api_key` is not set

use std::fmt;

use serde_json::Value;

use crate::error::ProviderError;

/// Environment variable consulted when `api_url` is not configured.
pub const API_URL_ENV: &str = "CUSTOM_API_URL";

/// Environment variable consulted when `api_key` is not configured.
pub const API_KEY_ENV: &str = "CUSTOM_API_KEY";

/// Connection settings for the backend API.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the API endpoint.
    pub api_url: String,
    /// Bearer credential sent with every request.
    pub api_key: String,
}

impl ProviderConfig {
    /// Create a configuration from explicit values.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read the configuration from the host's configuration object.
    ///
    /// Each attribute that is absent, null or empty is taken from its
    /// environment variable instead.
    pub fn from_value(config: &Value) -> Result<Self, ProviderError> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Like [`ProviderConfig::from_value`], with an explicit environment lookup.
    pub fn resolve<F>(config: &Value, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !(config.is_object() || config.is_null()) {
            return Err(ProviderError::Validation(
                "provider configuration must be an object".to_string(),
            ));
        }

        let api_url = lookup(config, "api_url", API_URL_ENV, &env)?
            .ok_or_else(|| ProviderError::Configuration("API URL is required".to_string()))?;
        let api_key = lookup(config, "api_key", API_KEY_ENV, &env)?
            .ok_or_else(|| ProviderError::Configuration("API key is required".to_string()))?;

        Ok(Self { api_url, api_key })
    }
}

fn lookup<F>(config: &Value, attr: &str, var: &str, env: &F) -> Result<Option<String>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    match config.get(attr) {
        Some(Value::String(s)) if !s.is_empty() => return Ok(Some(s.clone())),
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ProviderError::Validation(format!(
                "'{}' must be a string",
                attr
            )))
        }
    }
    Ok(env(var).filter(|v| !v.is_empty()))
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
