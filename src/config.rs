//! Provider configuration.
//!
//! Values come from the provider block, with each attribute falling back to
//! a `PINGDIRECTORY_PROVIDER_*` environment variable when left unset.

use serde::Deserialize;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Configuration constants for the configuration API.
pub mod api {
    /// Path of the configuration API below the HTTPS host.
    pub const BASE_PATH: &str = "/config";

    /// Schema URN prefix of every configuration object.
    pub const SCHEMA_PREFIX: &str = "urn:pingidentity:schemas:configuration:2.0:";

    /// Request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 60;

    /// Connect timeout in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Environment variable names.
pub mod env {
    /// HTTPS host, e.g. `https://localhost:1443`.
    pub const HTTPS_HOST: &str = "PINGDIRECTORY_PROVIDER_HTTPS_HOST";
    /// Basic auth username.
    pub const USERNAME: &str = "PINGDIRECTORY_PROVIDER_USERNAME";
    /// Basic auth password.
    pub const PASSWORD: &str = "PINGDIRECTORY_PROVIDER_PASSWORD";
    /// `true` to skip TLS certificate verification.
    pub const INSECURE_TRUST_ALL_TLS: &str = "PINGDIRECTORY_PROVIDER_INSECURE_TRUST_ALL_TLS";
    /// Comma separated list of PEM files to trust.
    pub const CA_CERTIFICATE_PEM_FILES: &str = "PINGDIRECTORY_PROVIDER_CA_CERTIFICATE_PEM_FILES";
    /// Version of the target server.
    pub const PRODUCT_VERSION: &str = "PINGDIRECTORY_PROVIDER_PRODUCT_VERSION";
}

/// Server versions whose configuration API this provider speaks.
pub const SUPPORTED_PRODUCT_VERSIONS: &[&str] = &["10.0.0.0", "10.1.0.0", "10.2.0.0", "10.3.0.0"];

/// The provider block as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawProviderConfig {
    https_host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    insecure_trust_all_tls: Option<bool>,
    ca_certificate_pem_files: Option<Vec<String>>,
    product_version: Option<String>,
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// HTTPS host, without the API base path.
    pub https_host: String,
    /// Basic auth username.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Skip TLS certificate verification.
    pub insecure_trust_all_tls: bool,
    /// Additional trusted CA certificates.
    pub ca_certificate_pem_files: Vec<String>,
    /// Version of the target server.
    pub product_version: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure_trust_all_tls", &self.insecure_trust_all_tls)
            .field("ca_certificate_pem_files", &self.ca_certificate_pem_files)
            .field("product_version", &self.product_version)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the configuration from the provider block and the process
    /// environment.
    pub fn from_value(config: &serde_json::Value) -> Result<Self, ProviderError> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve the configuration with an explicit environment lookup.
    pub fn resolve<F>(config: &serde_json::Value, lookup_env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawProviderConfig = if config.is_null() {
            RawProviderConfig::default()
        } else {
            serde_json::from_value(config.clone())?
        };

        let string_or_env = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| lookup_env(var))
                .unwrap_or_default()
        };

        let insecure_trust_all_tls = match raw.insecure_trust_all_tls {
            Some(v) => v,
            None => lookup_env(env::INSECURE_TRUST_ALL_TLS)
                .map(|v| parse_bool(&v))
                .transpose()?
                .unwrap_or(false),
        };

        let ca_certificate_pem_files = match raw.ca_certificate_pem_files {
            Some(files) => files,
            None => lookup_env(env::CA_CERTIFICATE_PEM_FILES)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        };

        let resolved = Self {
            https_host: string_or_env(raw.https_host, env::HTTPS_HOST)
                .trim_end_matches('/')
                .to_string(),
            username: string_or_env(raw.username, env::USERNAME),
            password: string_or_env(raw.password, env::PASSWORD),
            insecure_trust_all_tls,
            ca_certificate_pem_files,
            product_version: string_or_env(raw.product_version, env::PRODUCT_VERSION),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    fn validate(&self) -> Result<(), ProviderError> {
        if self.https_host.is_empty() {
            return Err(missing("https_host", env::HTTPS_HOST));
        }
        if !self.https_host.starts_with("https://") {
            return Err(ProviderError::Configuration(format!(
                "https_host must start with https://, got '{}'",
                self.https_host
            )));
        }
        if self.username.is_empty() {
            return Err(missing("username", env::USERNAME));
        }
        if self.password.is_empty() {
            return Err(missing("password", env::PASSWORD));
        }
        if self.product_version.is_empty() {
            return Err(missing("product_version", env::PRODUCT_VERSION));
        }
        if !SUPPORTED_PRODUCT_VERSIONS.contains(&self.product_version.as_str()) {
            return Err(ProviderError::Configuration(format!(
                "unsupported product_version '{}', supported versions: {}",
                self.product_version,
                SUPPORTED_PRODUCT_VERSIONS.join(", ")
            )));
        }
        if self.insecure_trust_all_tls && !self.ca_certificate_pem_files.is_empty() {
            return Err(ProviderError::Configuration(
                "insecure_trust_all_tls and ca_certificate_pem_files cannot both be set"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The base URL of the configuration API.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.https_host, api::BASE_PATH)
    }
}

fn missing(attribute: &str, var: &str) -> ProviderError {
    ProviderError::Configuration(format!(
        "{} must be set in the provider block or through {}",
        attribute, var
    ))
}

fn parse_bool(value: &str) -> Result<bool, ProviderError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(ProviderError::Configuration(format!(
            "{} must be true or false, got '{}'",
            env::INSECURE_TRUST_ALL_TLS,
            other
        ))),
    }
}

/// Warnings for settings that are valid but risky.
fn check<F>(raw: &RawProviderConfig, lookup_env: &F) -> Vec<Diagnostic>
where
    F: Fn(&str) -> Option<String>,
{
    let mut diagnostics = Vec::new();
    if raw.password.as_deref().is_some_and(|p| !p.is_empty()) && lookup_env(env::PASSWORD).is_some()
    {
        diagnostics.push(
            Diagnostic::warning("password is set both in configuration and in the environment")
                .with_attribute("password"),
        );
    }
    diagnostics
}

/// Validate a provider block without resolving it against the environment.
pub fn validate_config(config: &serde_json::Value) -> Vec<Diagnostic> {
    let mut diagnostics = crate::validation::validate(&provider_schema(), config);
    if let Some(host) = config.get("https_host").and_then(|v| v.as_str()) {
        if !host.starts_with("https://") {
            diagnostics.push(
                Diagnostic::error("Invalid https_host")
                    .with_detail(format!("must start with https://, got '{}'", host))
                    .with_attribute("https_host"),
            );
        }
    }
    if let Some(version) = config.get("product_version").and_then(|v| v.as_str()) {
        if !SUPPORTED_PRODUCT_VERSIONS.contains(&version) {
            diagnostics.push(
                Diagnostic::error("Unsupported product_version")
                    .with_detail(format!(
                        "supported versions: {}",
                        SUPPORTED_PRODUCT_VERSIONS.join(", ")
                    ))
                    .with_attribute("product_version"),
            );
        }
    }
    diagnostics.extend(check(
        &serde_json::from_value(config.clone()).unwrap_or_default(),
        &|name| std::env::var(name).ok(),
    ));
    diagnostics
}

/// Schema of the provider block.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_description("PingDirectory configuration API provider")
        .with_attribute(
            "https_host",
            Attribute::optional_string().with_description(format!(
                "URI for PingDirectory HTTPS port. \
                 Default value can be set with the {} environment variable.",
                env::HTTPS_HOST
            )),
        )
        .with_attribute(
            "username",
            Attribute::optional_string().with_description(format!(
                "Username for PingDirectory admin user. \
                 Default value can be set with the {} environment variable.",
                env::USERNAME
            )),
        )
        .with_attribute(
            "password",
            Attribute::optional_string().sensitive().with_description(format!(
                "Password for PingDirectory admin user. \
                 Default value can be set with the {} environment variable.",
                env::PASSWORD
            )),
        )
        .with_attribute(
            "insecure_trust_all_tls",
            Attribute::optional_bool().with_description(
                "Set to true to trust any certificate when connecting to the PingDirectory server. \
                 This is insecure and should not be enabled outside of testing.",
            ),
        )
        .with_attribute(
            "ca_certificate_pem_files",
            Attribute::optional_string_set().with_description(
                "Paths to files containing PEM-encoded certificates to be trusted as root CAs.",
            ),
        )
        .with_attribute(
            "product_version",
            Attribute::optional_string().with_description(format!(
                "Version of the PingDirectory server being configured. \
                 Default value can be set with the {} environment variable.",
                env::PRODUCT_VERSION
            )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn full_config() -> serde_json::Value {
        json!({
            "https_host": "https://localhost:1443/",
            "username": "cn=administrator",
            "password": "2FederateM0re",
            "product_version": "10.3.0.0"
        })
    }

    #[test]
    fn test_resolve_from_block() {
        let config = ProviderConfig::resolve(&full_config(), no_env).unwrap();
        assert_eq!(config.https_host, "https://localhost:1443");
        assert_eq!(config.base_url(), "https://localhost:1443/config");
        assert!(!config.insecure_trust_all_tls);
    }

    #[test]
    fn test_resolve_from_env() {
        let vars: HashMap<&str, &str> = [
            (env::HTTPS_HOST, "https://pd:1443"),
            (env::USERNAME, "cn=administrator"),
            (env::PASSWORD, "secret"),
            (env::PRODUCT_VERSION, "10.1.0.0"),
            (env::INSECURE_TRUST_ALL_TLS, "true"),
        ]
        .into_iter()
        .collect();
        let config = ProviderConfig::resolve(&serde_json::Value::Null, |n| {
            vars.get(n).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.https_host, "https://pd:1443");
        assert!(config.insecure_trust_all_tls);
        assert_eq!(config.product_version, "10.1.0.0");
    }

    #[test]
    fn test_block_wins_over_env() {
        let config = ProviderConfig::resolve(&full_config(), |n| {
            (n == env::USERNAME).then(|| "cn=other".to_string())
        })
        .unwrap();
        assert_eq!(config.username, "cn=administrator");
    }

    #[test]
    fn test_missing_host() {
        let err = ProviderConfig::resolve(&json!({"username": "u"}), no_env).unwrap_err();
        assert!(err.to_string().contains("https_host"));
    }

    #[test]
    fn test_unsupported_version() {
        let mut config = full_config();
        config["product_version"] = json!("9.0.0.0");
        let err = ProviderConfig::resolve(&config, no_env).unwrap_err();
        assert!(err.to_string().contains("unsupported product_version"));
    }

    #[test]
    fn test_tls_options_exclusive() {
        let mut config = full_config();
        config["insecure_trust_all_tls"] = json!(true);
        config["ca_certificate_pem_files"] = json!(["/tmp/ca.pem"]);
        assert!(ProviderConfig::resolve(&config, no_env).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ProviderConfig::resolve(&full_config(), no_env).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("2FederateM0re"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_config() {
        let diagnostics =
            validate_config(&json!({"https_host": "http://pd", "product_version": "1"}));
        assert_eq!(diagnostics.iter().filter(|d| d.is_error()).count(), 2);
        assert!(validate_config(&full_config())
            .iter()
            .all(|d| !d.is_error()));
    }
}
