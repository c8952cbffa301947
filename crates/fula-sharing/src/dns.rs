//! DNS TXT lookups

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors returned by a TXT resolver
#[derive(Error, Debug)]
pub enum DnsError {
    /// The name exists but has no TXT records, or does not exist
    #[error("no TXT records for {0}")]
    NoRecords(String),

    /// Lookup failed (timeout, server failure, ...)
    #[error("lookup failed for {host}: {reason}")]
    Lookup { host: String, reason: String },

    /// The configured DNS server address is not usable
    #[error("invalid DNS server address: {0}")]
    InvalidServer(String),
}

/// Looks up TXT records for a host
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Return every TXT record of `host`, each record's strings concatenated
    async fn lookup_txt(&self, host: &str) -> Result<Vec<String>, DnsError>;
}

/// TXT resolver backed by hickory-dns
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    /// Use the system resolver configuration
    pub fn from_system_conf() -> Result<Self, DnsError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| DnsError::InvalidServer(e.to_string()))?;
        Ok(Self { resolver })
    }

    /// Query a single name server, given as `ip` or `ip:port`
    pub fn with_server(server: &str) -> Result<Self, DnsError> {
        let addr = parse_server(server)?;
        let group = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        Ok(Self {
            resolver: TokioAsyncResolver::tokio(config, ResolverOpts::default()),
        })
    }

    /// Query `server` if given, the system configuration otherwise
    pub fn new(server: Option<&str>) -> Result<Self, DnsError> {
        match server {
            Some(server) if !server.is_empty() => Self::with_server(server),
            _ => Self::from_system_conf(),
        }
    }
}

fn parse_server(server: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    server
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| DnsError::InvalidServer(server.to_string()))
}

fn lookup_error(host: &str, err: ResolveError) -> DnsError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => DnsError::NoRecords(host.to_string()),
        _ => DnsError::Lookup {
            host: host.to_string(),
            reason: err.to_string(),
        },
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    #[instrument(skip(self))]
    async fn lookup_txt(&self, host: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self
            .resolver
            .txt_lookup(host)
            .await
            .map_err(|e| lookup_error(host, e))?;

        let records: Vec<String> = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect();

        debug!(count = records.len(), "TXT lookup complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server() {
        assert_eq!(
            parse_server("1.1.1.1:5353").unwrap(),
            "1.1.1.1:5353".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_server("8.8.8.8").unwrap(),
            "8.8.8.8:53".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_server("[2001:4860:4860::8888]:53").unwrap().port(),
            53
        );
        assert!(matches!(
            parse_server("dns.example.com"),
            Err(DnsError::InvalidServer(_))
        ));
    }

    #[tokio::test]
    async fn test_with_server_builds_resolver() {
        assert!(HickoryTxtResolver::with_server("127.0.0.1:53").is_ok());
        assert!(HickoryTxtResolver::with_server("nonsense").is_err());
    }
}
