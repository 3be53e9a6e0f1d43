// ABOUTME: Library root for dockyard - container fixtures for integration tests.
// ABOUTME: The CLI binary is in main.rs.

pub mod compose;
pub mod config;
pub mod error;
pub mod fleet;
pub mod handles;
pub mod reap;
pub mod runtime;
pub mod service;
pub mod services;
pub mod types;

#[cfg(test)]
mod testing;

pub use fleet::Fleet;
