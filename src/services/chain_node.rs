// ABOUTME: Chain node workload: regtest daemon with RPC readiness polling and peering.
// ABOUTME: Exposes its RPC client, ZeroMQ endpoints and port/credential accessors.

use super::rpc::{ChainRpc, RpcConnector, RpcEndpoint};
use crate::fleet::Fleet;
use crate::service::{
    CleanStrategy, ContainerSpec, PortSlot, PortTable, Service, ServiceCore, ServiceError,
    ServiceKind, ServiceProfile, Settings, classify,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{Instant, sleep};

pub const RPC_USER: &str = "rpcuser";
pub const RPC_PASSWORD: &str = "rpcpassword";

/// Every ZeroMQ topic the node publishes; all share one port.
pub const ZMQ_TOPICS: [&str; 6] = [
    "rawtx",
    "rawtxlock",
    "hashblock",
    "hashtx",
    "hashtxlock",
    "rawblock",
];

pub struct ChainNode {
    connector: Arc<dyn RpcConnector>,
    rpc_host: String,
    rpc: Option<Arc<dyn ChainRpc>>,
}

#[async_trait]
impl ServiceProfile for ChainNode {
    const KIND: ServiceKind = ServiceKind::ChainNode;
    const PORTS: &'static [PortSlot] = &[
        PortSlot::new("port", 20002, 29998),
        PortSlot::new("rpcport", 20002, 29998),
        PortSlot::new("zmqport", 40002, 40998),
    ];
    const IMAGE: &'static str = "axerunners/axed:evo-latest";

    fn default_settings() -> Settings {
        Settings::from([
            (RPC_USER.to_string(), "axerpc".to_string()),
            (RPC_PASSWORD.to_string(), "password".to_string()),
        ])
    }

    fn default_container(ports: &PortTable, settings: &Settings) -> ContainerSpec {
        let setting = |key: &str| settings.get(key).map(String::as_str).unwrap_or_default();
        let zmq = format!("tcp://0.0.0.0:{}", ports.port("zmqport"));

        let mut cmd = vec![
            "axed".to_string(),
            format!("-port={}", ports.port("port")),
            format!("-rpcuser={}", setting(RPC_USER)),
            format!("-rpcpassword={}", setting(RPC_PASSWORD)),
            "-rpcallowip=0.0.0.0/0".to_string(),
            "-regtest=1".to_string(),
            "-keypool=1".to_string(),
            "-addressindex=1".to_string(),
            "-spentindex=1".to_string(),
            "-txindex=1".to_string(),
            "-timestampindex=1".to_string(),
            "-daemon=0".to_string(),
            format!("-rpcport={}", ports.port("rpcport")),
        ];
        cmd.extend(ZMQ_TOPICS.iter().map(|topic| format!("-zmqpub{}={}", topic, zmq)));

        ports
            .iter()
            .fold(ContainerSpec::new(Self::IMAGE), |spec, (_, port)| {
                spec.publish(port, port)
            })
            .cmd(cmd)
    }

    fn new(fleet: &Fleet) -> Self {
        Self {
            connector: fleet.rpc_connector(),
            rpc_host: fleet.config().rpc_host.clone(),
            rpc: None,
        }
    }

    async fn wait_ready(&mut self, core: &ServiceCore) -> Result<(), ServiceError> {
        let kind = core.kind();
        let options = core.options();
        let rpc = self.connector.connect(&RpcEndpoint {
            host: self.rpc_host.clone(),
            port: options.port("rpcport"),
            user: options.setting(RPC_USER).unwrap_or_default().to_string(),
            password: options.setting(RPC_PASSWORD).unwrap_or_default().to_string(),
        });
        self.rpc = Some(rpc.clone());

        let policy = core.config().readiness;
        let deadline = policy.deadline.map(|d| Instant::now() + d);
        let mut polls = 0u32;

        loop {
            polls += 1;
            let err = match rpc.get_info().await {
                Ok(_) => {
                    tracing::debug!(service = %kind, polls, "node answered");
                    return Ok(());
                }
                Err(e) => e,
            };

            let message = err.to_string();
            if !core.is_running().await? {
                return Err(ServiceError::NotRunning {
                    kind,
                    last_error: message,
                });
            }
            if !classify::is_chain_loading(&message) {
                return Err(ServiceError::Rpc { kind, source: err });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(ServiceError::RetryExhausted {
                    kind,
                    attempts: polls,
                    last_error: message,
                });
            }

            tracing::debug!(service = %kind, polls, error = %message, "node still loading");
            sleep(policy.interval).await;
        }
    }

    async fn peer_connect(
        &self,
        core: &ServiceCore,
        peer: &Service<Self>,
    ) -> Result<(), ServiceError> {
        let rpc = self.require_rpc(core)?;
        let address = peer.p2p_address()?;
        tracing::debug!(service = %core.kind(), peer = %address, "adding peer");
        rpc.add_node(&address, "add")
            .await
            .map_err(|source| ServiceError::Rpc {
                kind: core.kind(),
                source,
            })
    }

    async fn peer_disconnect(
        &self,
        core: &ServiceCore,
        peer: &Service<Self>,
    ) -> Result<(), ServiceError> {
        let rpc = self.require_rpc(core)?;
        let address = peer.p2p_address()?;
        let kind = core.kind();
        tracing::debug!(service = %kind, peer = %address, "removing peer");
        rpc.disconnect_node(&address)
            .await
            .map_err(|source| ServiceError::Rpc { kind, source })?;
        rpc.add_node(&address, "remove")
            .await
            .map_err(|source| ServiceError::Rpc { kind, source })
    }

    fn clean_strategy(&self) -> CleanStrategy {
        CleanStrategy::Recreate
    }

    fn reset(&mut self) {
        self.rpc = None;
    }
}

impl ChainNode {
    fn require_rpc(&self, core: &ServiceCore) -> Result<&Arc<dyn ChainRpc>, ServiceError> {
        self.rpc
            .as_ref()
            .ok_or(ServiceError::NotInitialized { kind: core.kind() })
    }
}

impl Service<ChainNode> {
    /// The node's RPC client; `None` until the node has been started.
    pub fn rpc_api(&self) -> Option<&dyn ChainRpc> {
        if !self.is_initialized() {
            return None;
        }
        self.profile().rpc.as_deref()
    }

    /// Topic name to `tcp://ip:port`; empty before the node is started.
    pub fn zmq_sockets(&self) -> BTreeMap<&'static str, String> {
        let Ok(ip) = self.ip() else {
            return BTreeMap::new();
        };
        let port = self.options().port("zmqport");
        ZMQ_TOPICS
            .iter()
            .map(|topic| (*topic, format!("tcp://{}:{}", ip, port)))
            .collect()
    }

    /// Port shared by every ZeroMQ topic.
    pub fn zmq_port(&self) -> u16 {
        self.options().port("zmqport")
    }

    pub fn p2p_port(&self) -> u16 {
        self.options().port("port")
    }

    pub fn rpc_port(&self) -> u16 {
        self.options().port("rpcport")
    }

    pub fn rpc_user(&self) -> &str {
        self.options().setting(RPC_USER).unwrap_or_default()
    }

    pub fn rpc_password(&self) -> &str {
        self.options().setting(RPC_PASSWORD).unwrap_or_default()
    }

    /// `ip:port` other nodes use to peer with this one.
    pub fn p2p_address(&self) -> Result<String, ServiceError> {
        Ok(format!("{}:{}", self.ip()?, self.p2p_port()))
    }

    /// Mine `blocks` blocks on this node.
    pub async fn generate(&self, blocks: u32) -> Result<Vec<String>, ServiceError> {
        let rpc = self.rpc_api().ok_or(ServiceError::NotInitialized {
            kind: ServiceKind::ChainNode,
        })?;
        rpc.generate(blocks).await.map_err(|source| ServiceError::Rpc {
            kind: ServiceKind::ChainNode,
            source,
        })
    }

    pub async fn block_count(&self) -> Result<u64, ServiceError> {
        let rpc = self.rpc_api().ok_or(ServiceError::NotInitialized {
            kind: ServiceKind::ChainNode,
        })?;
        rpc.get_block_count()
            .await
            .map_err(|source| ServiceError::Rpc {
                kind: ServiceKind::ChainNode,
                source,
            })
    }

    pub async fn peer_count(&self) -> Result<usize, ServiceError> {
        let rpc = self.rpc_api().ok_or(ServiceError::NotInitialized {
            kind: ServiceKind::ChainNode,
        })?;
        rpc.get_peer_info()
            .await
            .map(|peers| peers.len())
            .map_err(|source| ServiceError::Rpc {
                kind: ServiceKind::ChainNode,
                source,
            })
    }
}
