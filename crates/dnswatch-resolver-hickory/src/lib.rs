// # hickory Record Resolver
//
// This crate provides the production `RecordResolver` for the DNS change
// monitor, backed by hickory-resolver.
//
// ## Upstreams
//
// - `system`: nameservers from the host configuration (`/etc/resolv.conf`)
// - `google`: 8.8.8.8 / 8.8.4.4
// - `cloudflare`: 1.1.1.1 / 1.0.0.1
//
// ## Rendering
//
// Answers are rendered to the same display strings the monitor compares:
//
// | Type  | Rendering                                  |
// |-------|--------------------------------------------|
// | A     | `93.184.216.34`                            |
// | AAAA  | `2606:2800:220:1:248:1893:25c8:1946`       |
// | CNAME | `edge.example.net.`                        |
// | MX    | `10 mail.example.com.`                     |
// | NS    | `a.iana-servers.net.`                      |
// | TXT   | character-strings concatenated, lossy UTF-8 |
//
// Records of other types in an answer (the CNAME chain behind an A query,
// for instance) are skipped.

use dnswatch_core::{Error, RecordResolver, RecordType, Result};

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType as WireType};
use hickory_resolver::{ResolveError, Resolver, TokioResolver};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which nameservers to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverPreset {
    /// Host configuration
    #[default]
    System,
    Google,
    Cloudflare,
}

impl ResolverPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverPreset::System => "system",
            ResolverPreset::Google => "google",
            ResolverPreset::Cloudflare => "cloudflare",
        }
    }
}

impl fmt::Display for ResolverPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolverPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(ResolverPreset::System),
            "google" => Ok(ResolverPreset::Google),
            "cloudflare" => Ok(ResolverPreset::Cloudflare),
            other => Err(Error::config(format!(
                "Unknown resolver '{}' (expected system, google or cloudflare)",
                other
            ))),
        }
    }
}

/// Record resolver over hickory-resolver
pub struct HickoryRecordResolver {
    resolver: TokioResolver,
    preset: ResolverPreset,
}

impl HickoryRecordResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `preset`: Nameservers to query
    /// - `query_timeout`: Timeout of a single query attempt
    ///
    /// # Errors
    ///
    /// `System` fails when the host resolver configuration cannot be read.
    pub fn new(preset: ResolverPreset, query_timeout: Duration) -> Result<Self> {
        let mut builder = match preset {
            ResolverPreset::System => TokioResolver::builder_tokio().map_err(|e| {
                Error::resolver(format!("failed to read system resolver config: {}", e))
            })?,
            ResolverPreset::Google => Resolver::builder_with_config(
                ResolverConfig::google(),
                TokioConnectionProvider::default(),
            ),
            ResolverPreset::Cloudflare => Resolver::builder_with_config(
                ResolverConfig::cloudflare(),
                TokioConnectionProvider::default(),
            ),
        };

        let opts = builder.options_mut();
        opts.timeout = query_timeout;
        // Every poll must see the authoritative answer, not a cached one
        opts.positive_max_ttl = Some(Duration::ZERO);
        opts.negative_max_ttl = Some(Duration::ZERO);

        tracing::debug!(
            "Created {} resolver (query timeout {:?})",
            preset,
            query_timeout
        );

        Ok(Self {
            resolver: builder.build(),
            preset,
        })
    }

    /// The configured upstream
    pub fn preset(&self) -> ResolverPreset {
        self.preset
    }
}

impl fmt::Debug for HickoryRecordResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryRecordResolver")
            .field("preset", &self.preset)
            .finish()
    }
}

#[async_trait::async_trait]
impl RecordResolver for HickoryRecordResolver {
    async fn resolve(&self, domain: &str, record_type: RecordType) -> Result<Vec<String>> {
        let lookup = self
            .resolver
            .lookup(domain, wire_type(record_type))
            .await
            .map_err(|e| map_resolve_error(domain, record_type, e))?;

        let values: Vec<String> = lookup
            .iter()
            .filter_map(|rdata| display_rdata(record_type, rdata))
            .collect();

        if values.is_empty() {
            return Err(Error::no_records(format!("{} {}", domain, record_type)));
        }

        Ok(values)
    }

    fn resolver_name(&self) -> &'static str {
        "hickory"
    }
}

fn wire_type(record_type: RecordType) -> WireType {
    match record_type {
        RecordType::A => WireType::A,
        RecordType::Aaaa => WireType::AAAA,
        RecordType::Cname => WireType::CNAME,
        RecordType::Mx => WireType::MX,
        RecordType::Ns => WireType::NS,
        RecordType::Txt => WireType::TXT,
    }
}

fn map_resolve_error(domain: &str, record_type: RecordType, e: ResolveError) -> Error {
    if e.is_no_records_found() || e.is_nx_domain() {
        Error::no_records(format!("{} {}", domain, record_type))
    } else {
        Error::resolver(format!("{} {} lookup failed: {}", domain, record_type, e))
    }
}

/// Render one answer record, or `None` if it is not of `record_type`
pub fn display_rdata(record_type: RecordType, rdata: &RData) -> Option<String> {
    match (record_type, rdata) {
        (RecordType::A, RData::A(a)) => Some(a.to_string()),
        (RecordType::Aaaa, RData::AAAA(aaaa)) => Some(aaaa.to_string()),
        (RecordType::Cname, RData::CNAME(cname)) => Some(cname.to_string()),
        (RecordType::Ns, RData::NS(ns)) => Some(ns.to_string()),
        (RecordType::Mx, RData::MX(mx)) => Some(format!("{} {}", mx.preference(), mx.exchange())),
        (RecordType::Txt, RData::TXT(txt)) => {
            // Join before decoding; a character may straddle two strings
            let bytes: Vec<u8> = txt.iter().flat_map(|data| data.iter().copied()).collect();
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => None,
    }
}
