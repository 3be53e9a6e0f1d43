// ABOUTME: Drive stack: content store, chain node and document store feeding the drive processes.
// ABOUTME: Members are cleaned, removed and connected together as one unit.

use super::ComposeError;
use super::teardown::remove_tier;
use super::wiring::drive_envs;
use crate::fleet::Fleet;
use crate::service::{Service, ServiceError, ServiceOverrides};
use crate::services::{ChainNode, ContentStore, DocumentStore, DriveApi, DriveSync};
use futures::FutureExt;
use serde::Deserialize;

/// Caller overrides per drive stack member; `drive` applies to both processes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriveOverrides {
    pub content_store: ServiceOverrides,
    pub chain_node: ServiceOverrides,
    pub document_store: ServiceOverrides,
    pub drive: ServiceOverrides,
}

pub struct DriveStack {
    pub content_store: Service<ContentStore>,
    pub chain_node: Service<ChainNode>,
    pub document_store: Service<DocumentStore>,
    pub drive_api: Service<DriveApi>,
    pub drive_sync: Service<DriveSync>,
}

impl DriveStack {
    /// Clean every member concurrently.
    pub async fn clean(&mut self) -> Result<(), ComposeError> {
        futures::try_join!(
            self.content_store.clean(),
            self.chain_node.clean(),
            self.document_store.clean(),
            self.drive_api.clean(),
            self.drive_sync.clean(),
        )?;
        Ok(())
    }

    /// Remove every member concurrently.
    pub async fn remove(&mut self) -> Result<(), ComposeError> {
        remove_tier(
            "drive",
            vec![
                self.content_store.remove().boxed(),
                self.chain_node.remove().boxed(),
                self.document_store.remove().boxed(),
                self.drive_api.remove().boxed(),
                self.drive_sync.remove().boxed(),
            ],
        )
        .await
    }

    /// Connect each member to its counterpart in `other`.
    pub async fn connect(&self, other: &DriveStack) -> Result<(), ComposeError> {
        futures::try_join!(
            self.content_store.connect(&other.content_store),
            self.chain_node.connect(&other.chain_node),
            self.document_store.connect(&other.document_store),
            self.drive_api.connect(&other.drive_api),
            self.drive_sync.connect(&other.drive_sync),
        )?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.content_store.is_initialized()
            || self.chain_node.is_initialized()
            || self.document_store.is_initialized()
            || self.drive_api.is_initialized()
            || self.drive_sync.is_initialized()
    }
}

impl Fleet {
    pub async fn start_drive(&self, overrides: &DriveOverrides) -> Result<DriveStack, ComposeError> {
        let mut stacks = self.start_drive_many(1, overrides).await?;
        stacks
            .pop()
            .ok_or(ComposeError::Service(ServiceError::InvalidInstanceCount(0)))
    }

    /// Start `n` drive stacks whose chain nodes are peered with each other.
    pub async fn start_drive_many(
        &self,
        n: usize,
        overrides: &DriveOverrides,
    ) -> Result<Vec<DriveStack>, ComposeError> {
        if n < 1 {
            return Err(ServiceError::InvalidInstanceCount(n).into());
        }

        let content_stores = self
            .start_many::<ContentStore>(n, &overrides.content_store)
            .await?;
        let chain_nodes = self.start_chain_nodes(n, &overrides.chain_node).await?;

        let mut stacks = Vec::with_capacity(n);
        for (content_store, chain_node) in content_stores.into_iter().zip(chain_nodes) {
            let document_store = self
                .start::<DocumentStore>(&overrides.document_store)
                .await?;

            let envs = drive_envs(&chain_node, &content_store, &document_store)?;
            let drive = overrides.drive.clone().envs(envs);
            let drive_api = self.start::<DriveApi>(&drive).await?;
            let drive_sync = self.start::<DriveSync>(&drive).await?;

            tracing::info!(instance = stacks.len(), "drive stack running");
            stacks.push(DriveStack {
                content_store,
                chain_node,
                document_store,
                drive_api,
                drive_sync,
            });
        }
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_fleet, fake_fleet_with_rpc, init_tracing, quick_config};

    #[tokio::test]
    async fn drive_processes_receive_dependency_addresses() {
        init_tracing();
        let (_fake, fleet) = fake_fleet(quick_config());
        let stack = fleet.start_drive(&DriveOverrides::default()).await.unwrap();

        for env in [
            stack.drive_api.inspect().await.unwrap().env,
            stack.drive_sync.inspect().await.unwrap().env,
        ] {
            assert!(env.contains(&format!(
                "STORAGE_MONGODB_URL={}",
                stack.document_store.mongodb_url().unwrap()
            )));
            assert!(env.contains(&format!(
                "AXECORE_JSON_RPC_HOST={}",
                stack.chain_node.ip().unwrap()
            )));
        }
    }

    #[tokio::test]
    async fn caller_envs_are_kept_next_to_wiring() {
        init_tracing();
        let (_fake, fleet) = fake_fleet(quick_config());
        let overrides = DriveOverrides {
            drive: ServiceOverrides::default().env("LOG_LEVEL", "trace"),
            ..Default::default()
        };
        let stack = fleet.start_drive(&overrides).await.unwrap();

        let env = stack.drive_api.inspect().await.unwrap().env;
        assert!(env.contains(&"LOG_LEVEL=trace".to_string()));
        assert!(env.iter().any(|e| e.starts_with("STORAGE_IPFS_MULTIADDR=")));
    }

    #[tokio::test]
    async fn remove_uninitializes_every_member() {
        init_tracing();
        let (fake, fleet) = fake_fleet(quick_config());
        let mut stack = fleet.start_drive(&DriveOverrides::default()).await.unwrap();
        assert_eq!(fake.running_count(), 5);

        stack.remove().await.unwrap();

        assert!(!stack.is_initialized());
        assert_eq!(fake.container_count(), 0);
    }

    #[tokio::test]
    async fn clean_recreates_stateful_members_only() {
        init_tracing();
        let (_fake, fleet) = fake_fleet(quick_config());
        let mut stack = fleet.start_drive(&DriveOverrides::default()).await.unwrap();
        let chain_id = stack.chain_node.container_id().cloned();
        let api_id = stack.drive_api.container_id().cloned();

        stack.clean().await.unwrap();

        assert_ne!(stack.chain_node.container_id().cloned(), chain_id);
        assert_eq!(stack.drive_api.container_id().cloned(), api_id);
    }

    #[tokio::test]
    async fn many_stacks_share_a_peered_chain() {
        init_tracing();
        let (fake, rpc, fleet) = fake_fleet_with_rpc(quick_config());
        let stacks = fleet
            .start_drive_many(2, &DriveOverrides::default())
            .await
            .unwrap();

        assert_eq!(stacks.len(), 2);
        assert_eq!(fake.running_count(), 10);
        let first = rpc.node_on(stacks[0].chain_node.rpc_port()).unwrap();
        assert_eq!(first.peers().len(), 1);

        stacks[1].connect(&stacks[0]).await.unwrap();
        let second = rpc.node_on(stacks[1].chain_node.rpc_port()).unwrap();
        assert_eq!(second.peers().len(), 1);
    }

    #[tokio::test]
    async fn zero_stacks_is_rejected() {
        init_tracing();
        let (_fake, fleet) = fake_fleet(quick_config());
        assert!(matches!(
            fleet.start_drive_many(0, &DriveOverrides::default()).await,
            Err(ComposeError::Service(ServiceError::InvalidInstanceCount(0)))
        ));
    }
}
