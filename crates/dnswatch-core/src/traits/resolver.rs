// # Record Resolver Trait
//
// Defines the interface for typed DNS queries against one domain.
//
// ## Implementations
//
// - hickory-resolver: `dnswatch-resolver-hickory` crate
//
// ## Usage
//
// ```rust,ignore
// use dnswatch_core::{RecordResolver, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* RecordResolver implementation */;
//
//     let mx = resolver.resolve("example.com", RecordType::Mx).await?;
//     // ["10 mail.example.com."]
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::snapshot::RecordType;

/// Trait for DNS resolver implementations
///
/// A resolver answers one record type for one domain and renders each
/// record as a display string:
///
/// | Type    | Display                          |
/// |---------|----------------------------------|
/// | A/AAAA  | plain address                    |
/// | CNAME   | target name                      |
/// | NS      | name server name                 |
/// | MX      | `"<preference> <exchange>"`      |
/// | TXT     | character-strings joined, UTF-8  |
///
/// # Errors
///
/// - `Error::NoRecords`: the query was answered but holds no records of
///   the type (NODATA or NXDOMAIN)
/// - any other error: the lookup failed (timeout, transport, SERVFAIL)
///
/// # Trust Level: Untrusted
///
/// Resolvers are single-shot. Retry cadence belongs to the monitor's poll
/// interval and the overall per-type ceiling is applied by
/// [`resolve_all`](crate::snapshot::resolve_all), so implementations only
/// need their own per-query timeout.
#[async_trait]
pub trait RecordResolver: Send + Sync {
    /// Resolve `record_type` records of `domain` into display strings
    async fn resolve(
        &self,
        domain: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
