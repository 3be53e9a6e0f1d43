// ABOUTME: The closed set of workloads a fleet can run.
// ABOUTME: Used as config keys, container labels and in error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    ChainNode,
    ContentStore,
    DocumentStore,
    DriveApi,
    DriveSync,
    Insight,
    DapiCore,
    TxFilterStream,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 8] = [
        ServiceKind::ChainNode,
        ServiceKind::ContentStore,
        ServiceKind::DocumentStore,
        ServiceKind::DriveApi,
        ServiceKind::DriveSync,
        ServiceKind::Insight,
        ServiceKind::DapiCore,
        ServiceKind::TxFilterStream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::ChainNode => "chain_node",
            ServiceKind::ContentStore => "content_store",
            ServiceKind::DocumentStore => "document_store",
            ServiceKind::DriveApi => "drive_api",
            ServiceKind::DriveSync => "drive_sync",
            ServiceKind::Insight => "insight",
            ServiceKind::DapiCore => "dapi_core",
            ServiceKind::TxFilterStream => "tx_filter_stream",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
