// ABOUTME: The concrete workloads of the stack and the chain node RPC client.
// ABOUTME: Each workload is a ServiceProfile plugged into the generic Service.

mod chain_node;
mod content_store;
mod document_store;
mod drive;
mod gateway;
mod insight;
mod rpc;

pub use chain_node::{ChainNode, RPC_PASSWORD, RPC_USER, ZMQ_TOPICS};
pub use content_store::ContentStore;
pub use document_store::DocumentStore;
pub use drive::{DriveApi, DriveSync};
pub use gateway::{DapiCore, TxFilterStream};
pub use insight::Insight;
pub use rpc::{
    ChainRpc, HttpRpcConnector, RpcClient, RpcConnector, RpcEndpoint, RpcError,
    UnavailableConnector,
};
