//! Gateway configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables read by [`GatewayConfig::load`]
pub const ENV_PREFIX: &str = "LINKSHARE";

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the gateway; requests for its host use share URLs
    pub url_base: String,
    /// How long resolved custom domain records stay cached (seconds)
    pub txt_record_ttl_secs: u64,
    /// DNS server for TXT lookups (`ip` or `ip:port`), system config if unset
    pub dns_server: Option<String>,
    /// Auth service base URL, required for access key ids
    pub auth_service_base_url: Option<String>,
    /// Auth service bearer token
    pub auth_service_token: Option<String>,
    /// Auth service request timeout (seconds)
    pub auth_service_timeout_secs: u64,
    /// Deadline for resolving a request (seconds)
    pub request_timeout_secs: u64,
    /// Reject private grants on custom domains
    pub require_public_custom_domain: bool,
    /// Rate limit (requests per second per client)
    pub rate_limit_rps: u32,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Local directory loaded into the in-memory storage at startup
    pub seed_dir: Option<PathBuf>,
    /// Project the seed directory is loaded into
    pub seed_project: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            url_base: "http://localhost:8080".to_string(),
            txt_record_ttl_secs: 60 * 60, // 1 hour
            dns_server: None,
            auth_service_base_url: None,
            auth_service_token: None,
            auth_service_timeout_secs: 10,
            request_timeout_secs: 30,
            require_public_custom_domain: false,
            rate_limit_rps: 100,
            cors_enabled: true,
            seed_dir: None,
            seed_project: "demo".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from an optional file and `LINKSHARE_*` variables
    ///
    /// The file format follows its extension (toml, yaml, json). Values not
    /// set anywhere keep their defaults.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .context("failed to load configuration")?;
        Ok(config)
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// TXT record cache lifetime
    pub fn txt_record_ttl(&self) -> Duration {
        Duration::from_secs(self.txt_record_ttl_secs)
    }

    /// Routing deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Auth service request timeout
    pub fn auth_service_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_service_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.txt_record_ttl(), Duration::from_secs(3600));
        assert!(!config.require_public_custom_domain);
        assert!(config.dns_server.is_none());
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
port = 9090
url_base = "https://link.example.com"
txt_record_ttl_secs = 120
dns_server = "1.1.1.1:53"
require_public_custom_domain = true
"#
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.url_base, "https://link.example.com");
        assert_eq!(config.txt_record_ttl(), Duration::from_secs(120));
        assert_eq!(config.dns_server.as_deref(), Some("1.1.1.1:53"));
        assert!(config.require_public_custom_domain);
        // Untouched values keep their defaults
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.rate_limit_rps, 100);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"seed_dir": "/srv/share", "seed_project": "site"}}"#).unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.seed_dir, Some(PathBuf::from("/srv/share")));
        assert_eq!(config.seed_project, "site");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(GatewayConfig::load(Some(&missing)).is_err());
    }
}
