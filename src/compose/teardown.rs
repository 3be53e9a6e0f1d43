// ABOUTME: Tiered teardown: each tier's removals run concurrently and failures are collected.
// ABOUTME: Members removed before a sibling failed stay removed.

use super::ComposeError;
use crate::service::ServiceError;
use futures::future::{BoxFuture, join_all};

pub(crate) type Removal<'a> = BoxFuture<'a, Result<(), ServiceError>>;

/// Await every removal of `tier`; fail with all errors if any failed.
pub(crate) async fn remove_tier(
    tier: &'static str,
    removals: Vec<Removal<'_>>,
) -> Result<(), ComposeError> {
    let total = removals.len();
    let failures: Vec<ServiceError> = join_all(removals)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect();

    if failures.is_empty() {
        tracing::debug!(tier, members = total, "tier removed");
        return Ok(());
    }

    for failure in &failures {
        tracing::warn!(tier, error = %failure, "member removal failed");
    }
    Err(ComposeError::Teardown { tier, failures })
}
