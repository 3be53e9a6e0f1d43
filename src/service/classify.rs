// ABOUTME: Substring classification of runtime and RPC error messages.
// ABOUTME: The only place that knows which engine/node phrases mean "retry".

/// Engine phrases reported when a host port is taken.
const PORT_CONFLICT_PHRASES: &[&str] = &["already allocated", "already in use"];

/// Node phrases reported while the chain is still loading.
const CHAIN_LOADING_PHRASES: &[&str] = &[
    "Loading",
    "Starting",
    "Verifying",
    "RPC",
    "Masternode cache is empty",
];

/// Case-sensitive, like the engine's own wording.
pub fn is_port_conflict(message: &str) -> bool {
    PORT_CONFLICT_PHRASES.iter().any(|p| message.contains(p))
}

pub fn is_chain_loading(message: &str) -> bool {
    CHAIN_LOADING_PHRASES.iter().any(|p| message.contains(p))
}
