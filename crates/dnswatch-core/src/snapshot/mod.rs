//! DNS snapshots
//!
//! A [`Snapshot`] is the set of records of the monitored types for one
//! domain at one point in time. Each queried type carries a
//! [`LookupOutcome`]: present with values, answered-but-empty, or failed.
//! Only present values take part in equality and diffing; the other two
//! outcomes exist so logs can tell "no MX records" from "MX lookup timed out".

pub mod diff;
pub mod resolve;

pub use diff::{ChangeRecord, diff};
pub use resolve::{SnapshotBuilder, resolve_all};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// DNS record types tracked by the monitor
///
/// The declaration order is the lexicographic order of the names, so the
/// derived `Ord` gives deterministic display and diff ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
    /// Text
    Txt,
}

impl RecordType {
    /// Every tracked type, in display order
    pub const ALL: [RecordType; 6] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Txt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|rt| rt.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_input(format!("Unsupported record type: {}", s)))
    }
}

/// Result of looking up one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// At least one record, already rendered for display
    Present(Vec<String>),
    /// The resolver answered with no records of this type
    Empty,
    /// Timeout, transport error, SERVFAIL and the like
    Failed(String),
}

impl LookupOutcome {
    /// Build an outcome from resolved values; no values means `Empty`
    pub fn from_values(values: Vec<String>) -> Self {
        if values.is_empty() {
            LookupOutcome::Empty
        } else {
            LookupOutcome::Present(values)
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, LookupOutcome::Present(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LookupOutcome::Failed(_))
    }
}

/// Records of every monitored type for one domain
///
/// Equality compares present values only, each type's values sorted first:
/// multi-value records are unordered from the monitor's perspective.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    outcomes: BTreeMap<RecordType, LookupOutcome>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of looking up `record_type`
    ///
    /// `Present` with no values is normalized to `Empty`.
    pub fn record(&mut self, record_type: RecordType, outcome: LookupOutcome) {
        let outcome = match outcome {
            LookupOutcome::Present(values) => LookupOutcome::from_values(values),
            other => other,
        };
        self.outcomes.insert(record_type, outcome);
    }

    /// Builder-style variant of [`Snapshot::record`] for present values
    pub fn with_records<S: Into<String>>(
        mut self,
        record_type: RecordType,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.record(record_type, LookupOutcome::Present(values));
        self
    }

    /// Values of `record_type`, or `None` when the type is not present
    pub fn get(&self, record_type: RecordType) -> Option<&[String]> {
        match self.outcomes.get(&record_type) {
            Some(LookupOutcome::Present(values)) => Some(values),
            _ => None,
        }
    }

    /// Values of `record_type`, sorted; empty when the type is not present
    pub fn sorted_values(&self, record_type: RecordType) -> Vec<String> {
        let mut values = self.get(record_type).map(<[String]>::to_vec).unwrap_or_default();
        values.sort();
        values
    }

    /// Outcome of the lookup for `record_type`, if it was queried
    pub fn outcome(&self, record_type: RecordType) -> Option<&LookupOutcome> {
        self.outcomes.get(&record_type)
    }

    /// Present types with their values, in `RecordType` order
    pub fn iter(&self) -> impl Iterator<Item = (RecordType, &[String])> {
        self.outcomes.iter().filter_map(|(rt, outcome)| match outcome {
            LookupOutcome::Present(values) => Some((*rt, values.as_slice())),
            _ => None,
        })
    }

    /// Present types, in `RecordType` order
    pub fn record_types(&self) -> impl Iterator<Item = RecordType> + '_ {
        self.iter().map(|(rt, _)| rt)
    }

    /// Types whose lookup failed, with the failure message
    pub fn failures(&self) -> impl Iterator<Item = (RecordType, &str)> {
        self.outcomes.iter().filter_map(|(rt, outcome)| match outcome {
            LookupOutcome::Failed(reason) => Some((*rt, reason.as_str())),
            _ => None,
        })
    }

    /// Number of present types
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no type is present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        diff(self, other).is_empty()
    }
}

impl Eq for Snapshot {}

impl<S: Into<String>> FromIterator<(RecordType, Vec<S>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (RecordType, Vec<S>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Snapshot::new(), |snapshot, (rt, values)| {
                snapshot.with_records(rt, values)
            })
    }
}
