// ABOUTME: Shared unit-test support: tracing setup, a scripted chain node and a fake fleet.
// ABOUTME: Compiled only for tests.

use crate::config::FleetConfig;
use crate::fleet::Fleet;
use crate::runtime::fake::FakeRuntime;
use crate::services::{ChainRpc, RpcConnector, RpcEndpoint, RpcError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

pub(crate) fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct NodeState {
    rpc_port: u16,
    info_errors: VecDeque<RpcError>,
    calls: Vec<(String, Vec<Value>)>,
    blocks: u64,
    /// Addresses shown by `getpeerinfo`, inbound and outbound.
    peers: BTreeSet<String>,
    /// Nodes this one exchanges blocks with.
    links: BTreeSet<usize>,
}

/// Every node handed out by one connector. Links are symmetric and blocks
/// spread across them, the way peered regtest daemons behave.
#[derive(Default)]
struct Mesh {
    nodes: Vec<NodeState>,
}

impl Mesh {
    /// Most recent node serving RPC on `port`.
    fn node_on(&self, port: u16) -> Option<usize> {
        self.nodes.iter().rposition(|n| n.rpc_port == port)
    }

    fn link(&mut self, a: usize, b: usize) {
        self.nodes[a].links.insert(b);
        self.nodes[b].links.insert(a);
        self.sync_from(a);
    }

    fn unlink(&mut self, a: usize, b: usize) {
        self.nodes[a].links.remove(&b);
        self.nodes[b].links.remove(&a);
    }

    /// Raise every node reachable from `start` to the highest height among them.
    fn sync_from(&mut self, start: usize) {
        let mut reached = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for &next in &self.nodes[i].links {
                if reached.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        let height = reached.iter().map(|&i| self.nodes[i].blocks).max().unwrap_or(0);
        for i in reached {
            self.nodes[i].blocks = height;
        }
    }
}

/// A chain node that answers from memory.
pub(crate) struct FakeRpc {
    id: usize,
    endpoint: RpcEndpoint,
    mesh: Arc<Mutex<Mesh>>,
    runtime: Option<Arc<FakeRuntime>>,
}

impl FakeRpc {
    pub fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.mesh.lock().nodes[self.id].calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params)
            .collect()
    }

    pub fn peers(&self) -> Vec<String> {
        self.mesh.lock().nodes[self.id].peers.iter().cloned().collect()
    }

    /// The node behind `address`, when the runtime knows it.
    fn resolve(&self, mesh: &Mesh, address: &str) -> Option<(usize, String)> {
        let runtime = self.runtime.as_ref()?;
        let peer = mesh.node_on(runtime.rpc_port_behind(address)?)?;
        let own = runtime.p2p_address_of(self.endpoint.port)?;
        Some((peer, own))
    }

    fn add_peer(&self, mesh: &mut Mesh, address: &str) {
        mesh.nodes[self.id].peers.insert(address.to_string());
        if let Some((peer, own)) = self.resolve(mesh, address) {
            mesh.nodes[peer].peers.insert(own);
            mesh.link(self.id, peer);
        }
    }

    fn drop_peer(&self, mesh: &mut Mesh, address: &str) {
        mesh.nodes[self.id].peers.remove(address);
        if let Some((peer, own)) = self.resolve(mesh, address) {
            mesh.nodes[peer].peers.remove(&own);
            mesh.unlink(self.id, peer);
        }
    }
}

#[async_trait]
impl ChainRpc for FakeRpc {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let mut mesh = self.mesh.lock();
        let id = self.id;
        mesh.nodes[id]
            .calls
            .push((method.to_string(), params.clone()));
        let address = params
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match method {
            "getinfo" => match mesh.nodes[id].info_errors.pop_front() {
                Some(err) => Err(err),
                None => Ok(json!({ "blocks": mesh.nodes[id].blocks })),
            },
            "getblockcount" => Ok(json!(mesh.nodes[id].blocks)),
            "generate" => {
                let n = params.first().and_then(Value::as_u64).unwrap_or(0);
                let first = mesh.nodes[id].blocks;
                mesh.nodes[id].blocks += n;
                let last = mesh.nodes[id].blocks;
                mesh.sync_from(id);
                Ok(json!(
                    (first..last)
                        .map(|h| format!("{:064x}", h + 1))
                        .collect::<Vec<_>>()
                ))
            }
            "getpeerinfo" => Ok(json!(
                mesh.nodes[id]
                    .peers
                    .iter()
                    .map(|addr| json!({ "addr": addr }))
                    .collect::<Vec<_>>()
            )),
            "addnode" => {
                match params.get(1).and_then(Value::as_str) {
                    Some("add") => self.add_peer(&mut mesh, &address),
                    Some("remove") => self.drop_peer(&mut mesh, &address),
                    _ => {}
                }
                Ok(Value::Null)
            }
            "disconnectnode" => {
                self.drop_peer(&mut mesh, &address);
                Ok(Value::Null)
            }
            _ => Err(RpcError::Server {
                code: -32601,
                message: "Method not found".into(),
            }),
        }
    }
}

type ConnectHook = Box<dyn Fn(&RpcEndpoint) + Send + Sync>;

/// Hands out [`FakeRpc`] nodes and remembers them in connect order.
///
/// With a runtime attached, `addnode` resolves peers through the running
/// containers, so peered nodes see each other and share blocks.
#[derive(Default)]
pub(crate) struct FakeConnector {
    mesh: Arc<Mutex<Mesh>>,
    runtime: Option<Arc<FakeRuntime>>,
    nodes: Mutex<Vec<Arc<FakeRpc>>>,
    info_errors: Mutex<VecDeque<RpcError>>,
    on_connect: Mutex<Option<ConnectHook>>,
}

impl FakeConnector {
    pub fn with_runtime(runtime: Arc<FakeRuntime>) -> Self {
        Self {
            runtime: Some(runtime),
            ..Default::default()
        }
    }

    /// `getinfo` failures the next connected node reports before answering.
    pub fn script_info_errors(&self, errors: impl IntoIterator<Item = RpcError>) {
        self.info_errors.lock().extend(errors);
    }

    pub fn on_connect(&self, hook: impl Fn(&RpcEndpoint) + Send + Sync + 'static) {
        *self.on_connect.lock() = Some(Box::new(hook));
    }

    pub fn nodes(&self) -> Vec<Arc<FakeRpc>> {
        self.nodes.lock().clone()
    }

    /// The most recent node connected on `port`.
    pub fn node_on(&self, port: u16) -> Option<Arc<FakeRpc>> {
        self.nodes
            .lock()
            .iter()
            .rev()
            .find(|n| n.endpoint.port == port)
            .cloned()
    }
}

impl RpcConnector for FakeConnector {
    fn connect(&self, endpoint: &RpcEndpoint) -> Arc<dyn ChainRpc> {
        if let Some(hook) = self.on_connect.lock().as_ref() {
            hook(endpoint);
        }
        let id = {
            let mut mesh = self.mesh.lock();
            mesh.nodes.push(NodeState {
                rpc_port: endpoint.port,
                info_errors: std::mem::take(&mut *self.info_errors.lock()),
                ..Default::default()
            });
            mesh.nodes.len() - 1
        };
        let node = Arc::new(FakeRpc {
            id,
            endpoint: endpoint.clone(),
            mesh: self.mesh.clone(),
            runtime: self.runtime.clone(),
        });
        self.nodes.lock().push(node.clone());
        node
    }
}

/// A fleet over an in-memory runtime and scripted chain nodes.
pub(crate) fn fake_fleet_with_rpc(
    config: FleetConfig,
) -> (Arc<FakeRuntime>, Arc<FakeConnector>, Fleet) {
    let runtime = Arc::new(FakeRuntime::new());
    let connector = Arc::new(FakeConnector::with_runtime(runtime.clone()));
    let fleet = Fleet::new(runtime.clone(), config).with_rpc_connector(connector.clone());
    (runtime, connector, fleet)
}

pub(crate) fn fake_fleet(config: FleetConfig) -> (Arc<FakeRuntime>, Fleet) {
    let (runtime, _, fleet) = fake_fleet_with_rpc(config);
    (runtime, fleet)
}

/// Defaults with no propagation pause, for tests that start chain nodes.
pub(crate) fn quick_config() -> FleetConfig {
    FleetConfig {
        propagation_wait: std::time::Duration::ZERO,
        ..Default::default()
    }
}
