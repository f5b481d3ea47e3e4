use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bridge_config::{BridgeConfig, ConfigProvider};
use bridge_db::LedgerService;
use bridge_rpc::Connector;
use bridge_sync::{PaymentBroker, SyncOrchestrator};

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: BridgeConfig,
    pub store: Arc<LedgerService>,
}

impl AppContext {
    /// Open the local ledger named in the config.
    pub async fn init(config: BridgeConfig) -> anyhow::Result<Self> {
        let path = Path::new(&config.store.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let store = LedgerService::new_local(&config.store.path)
            .await
            .with_context(|| format!("failed to open ledger at {}", config.store.path))?;

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// A connector for `tenant_id`. Sessions are opened lazily on first call.
    pub fn connector_for(&self, tenant_id: &str) -> anyhow::Result<Arc<Connector>> {
        let connection = self
            .config
            .connection_for(tenant_id)
            .with_context(|| format!("no ERP connection configured for tenant '{tenant_id}'"))?;
        let connector = Connector::from_config(&connection)
            .with_context(|| format!("failed to build ERP client for tenant '{tenant_id}'"))?;
        Ok(Arc::new(connector))
    }

    pub fn orchestrator_for(&self, tenant_id: &str) -> anyhow::Result<SyncOrchestrator> {
        Ok(SyncOrchestrator::new(
            self.store.clone(),
            self.connector_for(tenant_id)?,
            &self.config.sync,
        ))
    }

    pub fn broker_for(&self, tenant_id: &str) -> anyhow::Result<PaymentBroker> {
        Ok(PaymentBroker::new(self.connector_for(tenant_id)?))
    }
}
