//! Snapshot retrieval
//!
//! [`resolve_all`] fans out one lookup per [`RecordType`] and folds the
//! results into a [`Snapshot`]. A failing type never aborts the others:
//! every lookup is its own task with its own ceiling.

use super::{LookupOutcome, RecordType, Snapshot};
use crate::traits::RecordResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Resolve every tracked record type of `domain`
///
/// Each lookup is bounded by `lookup_timeout`. Failures are recorded in the
/// snapshot as [`LookupOutcome::Failed`] (or `Empty` for a no-records
/// answer) and never returned as errors. There are no retries.
pub async fn resolve_all(
    resolver: Arc<dyn RecordResolver>,
    domain: &str,
    lookup_timeout: Duration,
) -> Snapshot {
    let mut lookups = JoinSet::new();

    for record_type in RecordType::ALL {
        let resolver = Arc::clone(&resolver);
        let domain = domain.to_string();

        lookups.spawn(async move {
            let outcome =
                match tokio::time::timeout(lookup_timeout, resolver.resolve(&domain, record_type))
                    .await
                {
                    Ok(Ok(values)) => LookupOutcome::from_values(values),
                    Ok(Err(e)) if e.is_no_records() => LookupOutcome::Empty,
                    Ok(Err(e)) => LookupOutcome::Failed(e.to_string()),
                    Err(_) => LookupOutcome::Failed(format!(
                        "lookup exceeded {}s",
                        lookup_timeout.as_secs_f32()
                    )),
                };
            (record_type, outcome)
        });
    }

    let mut snapshot = Snapshot::new();
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((record_type, outcome)) => {
                debug!("{} {} lookup: {:?}", domain, record_type, outcome);
                snapshot.record(record_type, outcome);
            }
            Err(e) => {
                // The type stays absent, same as any other failure
                warn!("{} lookup task aborted: {}", domain, e);
            }
        }
    }

    snapshot
}

/// Takes snapshots of one domain through one resolver
///
/// Shared by the monitor loop and the `check` command so both see identical
/// semantics. Cheap to clone.
#[derive(Clone)]
pub struct SnapshotBuilder {
    resolver: Arc<dyn RecordResolver>,
    domain: Arc<str>,
    lookup_timeout: Duration,
}

impl SnapshotBuilder {
    /// Create a new builder
    ///
    /// # Parameters
    ///
    /// - `resolver`: Resolver implementation
    /// - `domain`: The monitored domain
    /// - `lookup_timeout`: Ceiling for each record type's lookup
    pub fn new(
        resolver: Arc<dyn RecordResolver>,
        domain: impl Into<String>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            domain: Arc::from(domain.into()),
            lookup_timeout,
        }
    }

    /// The domain this builder resolves
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Take a snapshot now
    pub async fn snapshot(&self) -> Snapshot {
        resolve_all(Arc::clone(&self.resolver), &self.domain, self.lookup_timeout).await
    }
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder")
            .field("resolver", &self.resolver.resolver_name())
            .field("domain", &self.domain)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}
