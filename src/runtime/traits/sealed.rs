// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only runtimes defined in this crate (the bollard runtime and the in-memory
/// runtime used by unit tests) can implement the capability traits.
pub trait Sealed {}
