// ABOUTME: Environment wiring between tiers, built from runtime-discovered addresses.
// ABOUTME: Pure functions over started services so the wiring can be checked in isolation.

use crate::service::{Service, ServiceError};
use crate::services::{ChainNode, ContentStore, DocumentStore, DriveApi, Insight};
use serde_json::{Value, json};

/// Env var carrying the indexer's JSON configuration document.
pub const INSIGHT_CONFIG_ENV: &str = "INSIGHT_CONFIG";

/// Host the indexer uses to reach the node's published ZeroMQ port.
const INSIGHT_ZMQ_HOST: &str = "host.docker.internal";

/// Env for the drive API and sync processes.
pub fn drive_envs(
    chain: &Service<ChainNode>,
    content: &Service<ContentStore>,
    mongo: &Service<DocumentStore>,
) -> Result<Vec<String>, ServiceError> {
    let hashblock = chain
        .zmq_sockets()
        .remove("hashblock")
        .ok_or(ServiceError::NotInitialized { kind: chain.kind() })?;

    Ok(vec![
        format!("AXECORE_ZMQ_PUB_HASHBLOCK={}", hashblock),
        format!("AXECORE_JSON_RPC_HOST={}", chain.ip()?),
        format!("AXECORE_JSON_RPC_PORT={}", chain.rpc_port()),
        format!("AXECORE_JSON_RPC_USER={}", chain.rpc_user()),
        format!("AXECORE_JSON_RPC_PASS={}", chain.rpc_password()),
        format!("STORAGE_IPFS_MULTIADDR={}", content.multiaddr()?),
        format!("STORAGE_MONGODB_URL={}", mongo.mongodb_url()?),
    ])
}

/// The indexer's config: `user` with the node connection merged over it.
pub fn insight_config(chain: &Service<ChainNode>, user: &Value) -> Result<Value, ServiceError> {
    let zmq = format!("tcp://{}:{}", INSIGHT_ZMQ_HOST, chain.zmq_port());
    let connection = json!({
        "servicesConfig": {
            "axed": {
                "connect": [{
                    "rpchost": chain.ip()?,
                    "rpcport": chain.rpc_port().to_string(),
                    "rpcuser": chain.rpc_user(),
                    "rpcpassword": chain.rpc_password(),
                    "zmqpubrawtx": zmq,
                    "zmqpubhashblock": zmq,
                }],
            },
        },
    });

    let mut config = match user {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    merge_json(&mut config, &connection);
    Ok(config)
}

/// Env for both gateways. `host_alias` replaces the drive API's IP when set.
pub fn dapi_envs(
    chain: &Service<ChainNode>,
    insight: &Service<Insight>,
    drive_api: &Service<DriveApi>,
    host_alias: Option<&str>,
) -> Result<Vec<String>, ServiceError> {
    let chain_ip = chain.ip()?;
    let drive_host = match host_alias {
        Some(alias) => alias.to_string(),
        None => drive_api.ip()?.to_string(),
    };

    Ok(vec![
        format!("INSIGHT_URI={}", insight.uri()?),
        format!("AXECORE_RPC_HOST={}", chain_ip),
        format!("AXECORE_RPC_PORT={}", chain.rpc_port()),
        format!("AXECORE_RPC_USER={}", chain.rpc_user()),
        format!("AXECORE_RPC_PASS={}", chain.rpc_password()),
        format!("AXECORE_ZMQ_HOST={}", chain_ip),
        format!("AXECORE_ZMQ_PORT={}", chain.zmq_port()),
        format!("AXECORE_P2P_HOST={}", chain_ip),
        format!("AXECORE_P2P_PORT={}", chain.p2p_port()),
        format!("DRIVE_RPC_PORT={}", drive_api.rpc_port()),
        "AXECORE_P2P_NETWORK=regtest".to_string(),
        "NETWORK=regtest".to_string(),
        format!("DRIVE_RPC_HOST={}", drive_host),
    ])
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge by key and arrays by index; any other overlay value
/// replaces what is in `base`.
pub fn merge_json(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_json(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (Value::Array(base), Value::Array(overlay)) => {
            for (i, value) in overlay.iter().enumerate() {
                match base.get_mut(i) {
                    Some(slot) => merge_json(slot, value),
                    None => base.push(value.clone()),
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
