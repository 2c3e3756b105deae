//! Tap configuration
//!
//! The configuration arrives as a JSON file (or inline JSON) with the account
//! credentials and the location to read. Optional fields tune the HTTP client.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::parse_business_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

/// Default identity provider
pub const DEFAULT_AUTH_URL: &str = "https://mte4-ohra-idm.oracleindustry.com";

/// Default data API base URL
pub const DEFAULT_API_URL: &str = "https://mte4-ohra.oracleindustry.com/bi/v1/SZH";

// ============================================================================
// Tap Config
// ============================================================================

/// Configuration of a tap run
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// OpenID client identifier of the API account
    #[serde(default)]
    pub client_id: String,

    /// Location reference sent as `locRef` on every data request
    #[serde(default)]
    pub location_reference: String,

    /// Organization short name used on sign-in
    #[serde(default)]
    pub organization_identificer: String,

    /// API account user name
    #[serde(default)]
    pub auth_username: String,

    /// API account password
    #[serde(default)]
    pub auth_password: String,

    /// First business date to read when no bookmark exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Identity provider base URL
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Data API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries of a data request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per second limit on the data API
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_rps() -> u32 {
    5
}

impl TapConfig {
    /// Parse and validate a configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("location_reference", &self.location_reference),
            ("organization_identificer", &self.organization_identificer),
            ("auth_username", &self.auth_username),
            ("auth_password", &self.auth_password),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        if let Some(start) = &self.start_date {
            if parse_business_date(start).is_none() {
                return Err(Error::invalid_value(
                    "start_date",
                    format!("'{start}' is neither YYYY-MM-DD nor RFC 3339"),
                ));
            }
        }

        for (field, url) in [("auth_url", &self.auth_url), ("api_url", &self.api_url)] {
            url::Url::parse(url).map_err(|e| Error::invalid_value(field, e.to_string()))?;
        }

        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }

        if self.requests_per_second == 0 {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be positive",
            ));
        }

        Ok(())
    }

    /// Configured start date, if any
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(parse_business_date)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Account credentials for the login handshake
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            organization: self.organization_identificer.clone(),
            username: self.auth_username.clone(),
            password: self.auth_password.clone(),
        }
    }

    /// HTTP client configuration for the data API
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(&self.api_url)
            .timeout(self.timeout())
            .max_retries(self.max_retries)
            .rate_limit(RateLimiterConfig::per_second(self.requests_per_second))
            .build()
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("client_id", &"<redacted>")
            .field("location_reference", &self.location_reference)
            .field("organization_identificer", &self.organization_identificer)
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .field("start_date", &self.start_date)
            .field("auth_url", &self.auth_url)
            .field("api_url", &self.api_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

/// JSON schema of the configuration, printed by `spec`
pub fn spec() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": [
            "client_id",
            "location_reference",
            "organization_identificer",
            "auth_username",
            "auth_password"
        ],
        "properties": {
            "client_id": {
                "type": "string",
                "description": "The client identifier of the Simphony API account",
                "secret": true
            },
            "location_reference": {
                "type": "string",
                "description": "The location reference to read data for"
            },
            "organization_identificer": {
                "type": "string",
                "description": "The organization short name"
            },
            "auth_username": {
                "type": "string",
                "description": "The API account user name"
            },
            "auth_password": {
                "type": "string",
                "description": "The API account password",
                "secret": true
            },
            "start_date": {
                "type": "string",
                "format": "date-time",
                "description": "The earliest business date to sync"
            },
            "auth_url": {
                "type": "string",
                "default": DEFAULT_AUTH_URL
            },
            "api_url": {
                "type": "string",
                "default": DEFAULT_API_URL
            },
            "timeout_seconds": {
                "type": "integer",
                "default": default_timeout()
            },
            "max_retries": {
                "type": "integer",
                "default": default_max_retries()
            },
            "requests_per_second": {
                "type": "integer",
                "default": default_rps()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn valid() -> Value {
        json!({
            "client_id": "client-123",
            "location_reference": "LOC1",
            "organization_identificer": "ORG",
            "auth_username": "api-user",
            "auth_password": "s3cret"
        })
    }

    #[test]
    fn test_defaults() {
        let config = TapConfig::from_value(valid()).unwrap();
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.start_date(), None);
    }

    #[test_case("client_id")]
    #[test_case("location_reference")]
    #[test_case("organization_identificer")]
    #[test_case("auth_username")]
    #[test_case("auth_password")]
    fn test_missing_required_field(field: &str) {
        let mut value = valid();
        value.as_object_mut().unwrap().remove(field);

        let err = TapConfig::from_value(value).unwrap_err();
        assert!(matches!(&err, Error::MissingConfigField { field: f } if f == field));
    }

    #[test]
    fn test_blank_field_is_missing() {
        let mut value = valid();
        value["auth_username"] = json!("  ");
        let err = TapConfig::from_value(value).unwrap_err();
        assert!(err.to_string().contains("auth_username"));
    }

    #[test_case("2025-03-01", Some((2025, 3, 1)) ; "plain date")]
    #[test_case("2025-03-01T00:00:00Z", Some((2025, 3, 1)) ; "rfc3339")]
    fn test_start_date(input: &str, expected: Option<(i32, u32, u32)>) {
        let mut value = valid();
        value["start_date"] = json!(input);
        let config = TapConfig::from_value(value).unwrap();
        assert_eq!(
            config.start_date(),
            expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        );
    }

    #[test]
    fn test_invalid_start_date() {
        let mut value = valid();
        value["start_date"] = json!("last tuesday");
        let err = TapConfig::from_value(value).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_invalid_url() {
        let mut value = valid();
        value["api_url"] = json!("not a url");
        assert!(TapConfig::from_value(value).is_err());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut value = valid();
        value["requests_per_second"] = json!(0);
        assert!(TapConfig::from_value(value).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = TapConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, valid().to_string()).unwrap();

        let config = TapConfig::from_file(&path).unwrap();
        assert_eq!(config.location_reference, "LOC1");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = TapConfig::from_value(valid()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("client-123"));
        assert!(debug.contains("api-user"));
    }

    #[test]
    fn test_credentials_and_http_config() {
        let mut value = valid();
        value["api_url"] = json!("http://localhost:1234/bi/v1/ORG");
        value["max_retries"] = json!(7);
        let config = TapConfig::from_value(value).unwrap();

        let credentials = config.credentials();
        assert_eq!(credentials.organization, "ORG");
        assert_eq!(credentials.username, "api-user");

        let http = config.http_config();
        assert_eq!(http.base_url.as_deref(), Some("http://localhost:1234/bi/v1/ORG"));
        assert_eq!(http.max_retries, 7);
    }

    #[test]
    fn test_spec_lists_required_fields() {
        let spec = spec();
        assert_eq!(spec["required"].as_array().unwrap().len(), 5);
        assert_eq!(spec["properties"]["auth_password"]["secret"], json!(true));
    }
}
