//! Application state

use crate::config::GatewayConfig;
use anyhow::Context;
use fula_sharing::{
    parse_url_base, AccessKeyResolver, AccessPolicy, AuthServiceClient, AuthServiceConfig,
    CredentialDecoder, CustomDomainResolver, HickoryTxtResolver, NoAuthService, ShareRouter,
    TxtRecordCache, TxtResolver,
};
use fula_storage::{AccessGrant, MemoryStorage, ObjectStorage};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Storage network
    pub storage: Arc<dyn ObjectStorage>,
    /// Request router
    pub router: ShareRouter,
}

impl AppState {
    /// Create the application state from configuration
    ///
    /// Builds the DNS client and auth service client the configuration names
    /// and loads the seed directory, if any.
    pub async fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let dns: Arc<dyn TxtResolver> = Arc::new(
            HickoryTxtResolver::new(config.dns_server.as_deref())
                .context("failed to create DNS resolver")?,
        );
        match &config.dns_server {
            Some(server) => info!("TXT lookups via {}", server),
            None => info!("TXT lookups via system resolver"),
        }

        let resolver: Arc<dyn AccessKeyResolver> = match &config.auth_service_base_url {
            Some(base_url) => {
                let auth = AuthServiceConfig::new(
                    base_url.clone(),
                    config.auth_service_token.clone().unwrap_or_default(),
                )
                .with_timeout(config.auth_service_timeout());
                info!("Auth service: {}", base_url);
                Arc::new(AuthServiceClient::new(auth)?)
            }
            None => {
                warn!("No auth service configured - access key ids will be rejected");
                Arc::new(NoAuthService)
            }
        };

        let storage = MemoryStorage::new();
        if let Some(dir) = &config.seed_dir {
            let count = storage
                .load_dir(&config.seed_project, dir)
                .await
                .with_context(|| format!("failed to seed from {}", dir.display()))?;
            let grant = AccessGrant::new(config.seed_project.clone());
            info!(
                objects = count,
                project = %config.seed_project,
                access = %grant.serialize(),
                "Seeded in-memory storage from {}",
                dir.display()
            );
        }

        Self::with_components(config, Arc::new(storage), dns, resolver)
    }

    /// Create the application state around explicit collaborators
    pub fn with_components(
        config: GatewayConfig,
        storage: Arc<dyn ObjectStorage>,
        dns: Arc<dyn TxtResolver>,
        resolver: Arc<dyn AccessKeyResolver>,
    ) -> anyhow::Result<Self> {
        let base = parse_url_base(&config.url_base)
            .with_context(|| format!("invalid url_base {:?}", config.url_base))?;

        let decoder = Arc::new(CredentialDecoder::new(Arc::clone(&storage), resolver));

        let policy = if config.require_public_custom_domain {
            AccessPolicy::PublicOnly
        } else {
            AccessPolicy::AllowPrivate
        };
        let domains = Arc::new(CustomDomainResolver::new(
            Arc::new(TxtRecordCache::new(config.txt_record_ttl())),
            dns,
            Arc::clone(&decoder),
            policy,
        ));

        let router = ShareRouter::new(base, Arc::clone(&storage), decoder, domains)
            .with_timeout(config.request_timeout());

        Ok(Self {
            config,
            storage,
            router,
        })
    }
}
