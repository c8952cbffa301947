//! Fula Link Sharing - serve shared objects over HTTP

use clap::Parser;
use fula_linkshare::{run_server, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fula-linkshare")]
#[command(about = "Link sharing gateway for Fula storage")]
#[command(version)]
struct Args {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, env = "LINKSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long, env = "LINKSHARE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LINKSHARE_PORT")]
    port: Option<u16>,

    /// Public base URL, e.g. https://link.example.com
    #[arg(long, env = "LINKSHARE_URL_BASE")]
    url_base: Option<String>,

    /// Lifetime of cached custom domain records (seconds)
    #[arg(long, env = "LINKSHARE_TXT_RECORD_TTL_SECS")]
    txt_record_ttl_secs: Option<u64>,

    /// DNS server for TXT lookups (ip or ip:port)
    #[arg(long, env = "LINKSHARE_DNS_SERVER")]
    dns_server: Option<String>,

    /// Auth service base URL for resolving access key ids
    #[arg(long, env = "LINKSHARE_AUTH_SERVICE_BASE_URL")]
    auth_service_base_url: Option<String>,

    /// Auth service bearer token
    #[arg(long, env = "LINKSHARE_AUTH_SERVICE_TOKEN", hide_env_values = true)]
    auth_service_token: Option<String>,

    /// Reject private grants on custom domains
    #[arg(long, env = "LINKSHARE_REQUIRE_PUBLIC_CUSTOM_DOMAIN")]
    require_public_custom_domain: bool,

    /// Directory to load into the in-memory storage (development)
    #[arg(long, env = "LINKSHARE_SEED_DIR")]
    seed_dir: Option<PathBuf>,

    /// Project the seed directory is loaded into
    #[arg(long, env = "LINKSHARE_SEED_PROJECT")]
    seed_project: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "LINKSHARE_DEBUG")]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, env = "LINKSHARE_JSON_LOGS")]
    json_logs: bool,
}

impl Args {
    /// Command line values take precedence over file and environment
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url_base) = self.url_base {
            config.url_base = url_base;
        }
        if let Some(ttl) = self.txt_record_ttl_secs {
            config.txt_record_ttl_secs = ttl;
        }
        if self.dns_server.is_some() {
            config.dns_server = self.dns_server;
        }
        if self.auth_service_base_url.is_some() {
            config.auth_service_base_url = self.auth_service_base_url;
        }
        if self.auth_service_token.is_some() {
            config.auth_service_token = self.auth_service_token;
        }
        if self.require_public_custom_domain {
            config.require_public_custom_domain = true;
        }
        if self.seed_dir.is_some() {
            config.seed_dir = self.seed_dir;
        }
        if let Some(project) = self.seed_project {
            config.seed_project = project;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "fula_linkshare={level},fula_sharing={level},tower_http=debug",
            level = log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Build configuration
    let mut config = GatewayConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    tracing::info!(
        "Starting Fula link sharing on {} (base URL {})",
        config.bind_addr(),
        config.url_base
    );
    if config.seed_dir.is_some() {
        tracing::warn!("Serving from in-memory storage - data will NOT persist!");
    }

    // Run the server
    run_server(config, shutdown_signal()).await
}
