// ABOUTME: Full stack: storage tier, drive and indexer tier, then the two gateways.
// ABOUTME: Teardown mirrors start order; clean rebuilds the stack in place.

use super::ComposeError;
use super::teardown::remove_tier;
use super::wiring::{INSIGHT_CONFIG_ENV, dapi_envs, drive_envs, insight_config};
use crate::fleet::Fleet;
use crate::service::{Service, ServiceError, ServiceOverrides};
use crate::services::{
    ChainNode, ContentStore, DapiCore, DocumentStore, DriveApi, DriveSync, Insight, TxFilterStream,
};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;

/// Caller overrides per member of the full stack.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FullStackOverrides {
    pub content_store: ServiceOverrides,
    pub chain_node: ServiceOverrides,
    pub document_store: ServiceOverrides,
    /// Applied to the drive API and drive sync.
    pub drive: ServiceOverrides,
    pub insight: ServiceOverrides,
    /// Indexer configuration the node connection is merged into.
    pub insight_config: Value,
    /// Applied to both gateways.
    pub dapi: ServiceOverrides,
}

pub struct FullStack {
    pub content_store: Service<ContentStore>,
    pub chain_node: Service<ChainNode>,
    pub document_store: Service<DocumentStore>,
    pub drive_api: Service<DriveApi>,
    pub drive_sync: Service<DriveSync>,
    pub insight: Service<Insight>,
    pub dapi_core: Service<DapiCore>,
    pub tx_filter_stream: Service<TxFilterStream>,
    fleet: Fleet,
    overrides: FullStackOverrides,
}

impl FullStack {
    /// Remove every member, gateways first and storage last.
    ///
    /// A failing tier stops the teardown; members of that tier that were
    /// removed stay removed.
    pub async fn remove(&mut self) -> Result<(), ComposeError> {
        remove_tier(
            "gateway",
            vec![
                self.dapi_core.remove().boxed(),
                self.tx_filter_stream.remove().boxed(),
            ],
        )
        .await?;
        remove_tier(
            "application",
            vec![
                self.drive_api.remove().boxed(),
                self.drive_sync.remove().boxed(),
                self.insight.remove().boxed(),
            ],
        )
        .await?;
        remove_tier(
            "storage",
            vec![
                self.content_store.remove().boxed(),
                self.chain_node.remove().boxed(),
                self.document_store.remove().boxed(),
            ],
        )
        .await?;
        tracing::info!("full stack removed");
        Ok(())
    }

    /// Remove the stack and replace it with a freshly started one built
    /// from the same overrides.
    pub async fn clean(&mut self) -> Result<(), ComposeError> {
        self.remove().await?;
        let fresh = self.fleet.start_full_stack(&self.overrides).await?;
        *self = fresh;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.content_store.is_initialized()
            || self.chain_node.is_initialized()
            || self.document_store.is_initialized()
            || self.drive_api.is_initialized()
            || self.drive_sync.is_initialized()
            || self.insight.is_initialized()
            || self.dapi_core.is_initialized()
            || self.tx_filter_stream.is_initialized()
    }

    pub fn overrides(&self) -> &FullStackOverrides {
        &self.overrides
    }
}

impl Fleet {
    pub async fn start_full_stack(
        &self,
        overrides: &FullStackOverrides,
    ) -> Result<FullStack, ComposeError> {
        let o = overrides;

        let (content_store, chain_node, document_store) = tokio::try_join!(
            self.start::<ContentStore>(&o.content_store),
            self.start::<ChainNode>(&o.chain_node),
            self.start::<DocumentStore>(&o.document_store),
        )?;
        tracing::debug!("storage tier running");

        let drive = o
            .drive
            .clone()
            .envs(drive_envs(&chain_node, &content_store, &document_store)?);
        let config = insight_config(&chain_node, &o.insight_config)?;
        let insight_overrides = o.insight.clone().env(INSIGHT_CONFIG_ENV, config);

        let mut drive_api = self.create::<DriveApi>(&drive)?;
        let mut drive_sync = self.create::<DriveSync>(&drive)?;
        let mut insight = self.create::<Insight>(&insight_overrides)?;
        tokio::try_join!(drive_api.start(), drive_sync.start(), insight.start())?;
        tracing::debug!("application tier running");

        let alias = self.config().host_alias.resolve();
        let dapi = o.dapi.clone().envs(dapi_envs(
            &chain_node,
            &insight,
            &drive_api,
            alias.as_deref(),
        )?);

        let mut dapi_core = self.create::<DapiCore>(&dapi)?;
        let mut tx_filter_stream = self.create::<TxFilterStream>(&dapi)?;
        tokio::try_join!(dapi_core.start(), tx_filter_stream.start())?;
        tracing::info!("full stack running");

        Ok(FullStack {
            content_store,
            chain_node,
            document_store,
            drive_api,
            drive_sync,
            insight,
            dapi_core,
            tx_filter_stream,
            fleet: self.clone(),
            overrides: overrides.clone(),
        })
    }

    /// Only a single full stack is supported; larger counts fail before
    /// anything is started.
    pub async fn start_full_stack_many(
        &self,
        n: usize,
        overrides: &FullStackOverrides,
    ) -> Result<Vec<FullStack>, ComposeError> {
        match n {
            0 => Err(ServiceError::InvalidInstanceCount(n).into()),
            1 => Ok(vec![self.start_full_stack(overrides).await?]),
            _ => Err(ComposeError::MultipleInstancesUnsupported(n)),
        }
    }
}
