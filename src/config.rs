use std::env;
use anyhow::{bail, Context, Result};

use crate::cors::CorsPolicy;
use crate::path::{is_under_prefix, normalize_api_prefix};

const DEFAULT_RESERVED_PREFIXES: &str =
    "/health,/swagger-ui,/api-docs,/.well-known,/robots.txt,/favicon.ico";

#[derive(Debug, Clone)]
pub struct Config {
    pub service_port: u16,
    pub service_host: String,
    pub storage: StorageConfig,
    pub site: SiteSettings,
}

/// Which Item Store backend to run against
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Memory,
    Spanner(SpannerConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

/// Resolver and write-policy settings, fixed for the life of the process
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub api_prefix: String,
    pub max_defined_path_level: usize,
    pub max_guest_validity: u64,
    pub lockdown_mode: bool,
    pub allow_cors: CorsPolicy,
    pub admin_token: String,
    pub reserved_prefixes: Vec<String>,
}

impl SiteSettings {
    /// Operational paths that only an overriding admin may claim
    ///
    /// The API prefix is always reserved: requests below it never reach the
    /// resolver, so an item stored there could not be served.
    pub fn is_reserved(&self, path: &str) -> bool {
        is_under_prefix(path, &self.api_prefix)
            || self
                .reserved_prefixes
                .iter()
                .any(|prefix| is_under_prefix(path, prefix))
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("spanner") {
            "memory" => StorageConfig::Memory,
            "spanner" => StorageConfig::Spanner(SpannerConfig {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: lookup("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: lookup("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: lookup("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            }),
            other => bail!("STORAGE_BACKEND must be one of: spanner, memory, got '{}'", other),
        };

        let api_prefix = normalize_api_prefix(
            &lookup("API_PREFIX").unwrap_or_else(|| "/_".to_string()),
        );
        if api_prefix.is_empty() {
            bail!("API_PREFIX must contain at least one path segment");
        }

        let max_defined_path_level = lookup("MAX_DEFINED_PATH_LEVEL")
            .unwrap_or_else(|| "2".to_string())
            .parse::<usize>()
            .context("MAX_DEFINED_PATH_LEVEL must be a non-negative integer")?;

        let max_guest_validity = lookup("MAX_GUEST_VALIDITY")
            .unwrap_or_else(|| "300".to_string())
            .parse::<u64>()
            .context("MAX_GUEST_VALIDITY must be a non-negative number of seconds")?;

        let lockdown_mode = match lookup("LOCKDOWN_MODE") {
            Some(raw) => parse_flag(&raw).context("LOCKDOWN_MODE must be true or false")?,
            None => false,
        };

        let allow_cors = CorsPolicy::parse(&lookup("ALLOW_CORS").unwrap_or_default());

        let admin_token = lookup("ADMIN_TOKEN")
            .filter(|token| !token.is_empty())
            .context("ADMIN_TOKEN environment variable is required")?;

        let reserved_prefixes = lookup("RESERVED_PREFIXES")
            .unwrap_or_else(|| DEFAULT_RESERVED_PREFIXES.to_string())
            .split(',')
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| prefix.to_lowercase())
            .collect();

        Ok(Config {
            service_port,
            service_host,
            storage,
            site: SiteSettings {
                api_prefix,
                max_defined_path_level,
                max_guest_validity,
                lockdown_mode,
                allow_cors,
                admin_token,
                reserved_prefixes,
            },
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.storage {
            StorageConfig::Memory => tracing::info!("  Storage: in-memory (not persisted)"),
            StorageConfig::Spanner(spanner) => {
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner project: {}", spanner.project);
                tracing::info!("  Spanner instance: {}", spanner.instance);
                tracing::info!("  Spanner database: {}", spanner.database);
            }
        }
        tracing::info!("  API prefix: {}", self.site.api_prefix);
        tracing::info!("  Max defined path level: {}", self.site.max_defined_path_level);
        tracing::info!("  Max guest validity: {}s", self.site.max_guest_validity);
        tracing::info!("  Lockdown mode: {}", self.site.lockdown_mode);
        tracing::info!("  CORS: {}", self.site.allow_cors);
        tracing::info!("  Reserved prefixes: {}", self.site.reserved_prefixes.join(", "));
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognized flag value '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("SPANNER_PROJECT", "test-project"),
        ("SPANNER_INSTANCE", "test-instance"),
        ("SPANNER_DATABASE", "test-database"),
        ("ADMIN_TOKEN", "secret"),
    ];

    #[test]
    fn test_config_with_all_vars() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SPANNER_EMULATOR_HOST", "localhost:9010"),
            ("SERVICE_PORT", "8080"),
            ("SERVICE_HOST", "127.0.0.1"),
            ("API_PREFIX", "api/"),
            ("MAX_DEFINED_PATH_LEVEL", "3"),
            ("MAX_GUEST_VALIDITY", "0"),
            ("LOCKDOWN_MODE", "true"),
            ("ALLOW_CORS", "short.example, example.org"),
            ("RESERVED_PREFIXES", "/Status, /internal"),
        ]);

        let config = config_from(&vars).unwrap();

        assert_eq!(
            config.storage,
            StorageConfig::Spanner(SpannerConfig {
                emulator_host: Some("localhost:9010".to_string()),
                project: "test-project".to_string(),
                instance: "test-instance".to_string(),
                database: "test-database".to_string(),
            })
        );
        assert_eq!(config.service_port, 8080);
        assert_eq!(config.service_host, "127.0.0.1");
        assert_eq!(config.site.api_prefix, "/api");
        assert_eq!(config.site.max_defined_path_level, 3);
        assert_eq!(config.site.max_guest_validity, 0);
        assert!(config.site.lockdown_mode);
        assert_eq!(
            config.site.allow_cors,
            CorsPolicy::AllowList(vec!["short.example".to_string(), "example.org".to_string()])
        );
        assert_eq!(config.site.reserved_prefixes, vec!["/status", "/internal"]);
    }

    #[test]
    fn test_config_with_defaults() {
        let config = config_from(&REQUIRED).unwrap();

        assert_eq!(config.service_port, 3000);
        assert_eq!(config.service_host, "0.0.0.0");
        assert_eq!(config.site.api_prefix, "/_");
        assert_eq!(config.site.max_defined_path_level, 2);
        assert_eq!(config.site.max_guest_validity, 300);
        assert!(!config.site.lockdown_mode);
        assert_eq!(config.site.allow_cors, CorsPolicy::Closed);
        assert!(config.site.is_reserved("/health"));
        assert!(config.site.is_reserved("/.well-known/security.txt"));
    }

    #[test]
    fn test_memory_backend_needs_no_spanner_vars() {
        let config = config_from(&[("STORAGE_BACKEND", "memory"), ("ADMIN_TOKEN", "t")]).unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
    }

    #[test]
    fn test_missing_required_var() {
        let result = config_from(&[
            ("SPANNER_PROJECT", "test-project"),
            ("SPANNER_INSTANCE", "test-instance"),
            ("ADMIN_TOKEN", "secret"),
        ]);
        // Missing SPANNER_DATABASE
        let error = result.unwrap_err();
        assert!(error.to_string().contains("SPANNER_DATABASE"));
    }

    #[test]
    fn test_missing_admin_token() {
        let error = config_from(&[("STORAGE_BACKEND", "memory")]).unwrap_err();
        assert!(error.to_string().contains("ADMIN_TOKEN"));

        let error = config_from(&[("STORAGE_BACKEND", "memory"), ("ADMIN_TOKEN", "")]).unwrap_err();
        assert!(error.to_string().contains("ADMIN_TOKEN"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVICE_PORT", "not-a-number"));

        let error = config_from(&vars).unwrap_err();
        assert!(error.to_string().contains("SERVICE_PORT"));
    }

    #[test]
    fn test_port_out_of_range() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVICE_PORT", "99999"));

        assert!(config_from(&vars).is_err());
    }

    #[test]
    fn test_unknown_backend() {
        let error = config_from(&[("STORAGE_BACKEND", "redis"), ("ADMIN_TOKEN", "t")]).unwrap_err();
        assert!(error.to_string().contains("STORAGE_BACKEND"));
    }

    #[test]
    fn test_root_api_prefix_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("API_PREFIX", "/"));

        let error = config_from(&vars).unwrap_err();
        assert!(error.to_string().contains("API_PREFIX"));
    }

    #[test]
    fn test_invalid_lockdown_flag() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LOCKDOWN_MODE", "sometimes"));

        let error = config_from(&vars).unwrap_err();
        assert!(error.to_string().contains("LOCKDOWN_MODE"));
    }

    #[test]
    fn test_api_prefix_is_always_reserved() {
        let config = config_from(&[("STORAGE_BACKEND", "memory"), ("ADMIN_TOKEN", "t")]).unwrap();
        assert!(config.site.is_reserved("/_"));
        assert!(config.site.is_reserved("/_/x"));
        assert!(!config.site.is_reserved("/docs"));
    }
}
