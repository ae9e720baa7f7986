//! Human-readable rendering of snapshots, changes and monitor status
//!
//! Everything handed to a transport goes through [`truncate`] first.

use crate::snapshot::{ChangeRecord, Snapshot};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Rendered in place of an empty snapshot
pub const NO_RECORDS: &str = "No DNS records found";

/// Appended to truncated messages
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Default transport ceiling, below Telegram's 4096-character hard limit
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;

/// Below this age a check is reported as "just now"
const JUST_NOW: Duration = Duration::from_secs(30);

/// From this age on a check is reported with its absolute time
const ABSOLUTE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Separator between the values of one record type
const VALUE_SEPARATOR: &str = " | ";

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(VALUE_SEPARATOR)
    }
}

/// Render a snapshot, one line per present type
///
/// `"<TYPE>: <v1> | <v2>"`, types in `RecordType` order and values sorted,
/// so equal snapshots render identically.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return NO_RECORDS.to_string();
    }

    snapshot
        .record_types()
        .map(|record_type| {
            format!(
                "{}: {}",
                record_type,
                snapshot.sorted_values(record_type).join(VALUE_SEPARATOR)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render detected changes as an alert
pub fn format_diff(domain: &str, changes: &[ChangeRecord]) -> String {
    let blocks: Vec<String> = changes
        .iter()
        .map(|change| {
            format!(
                "{}:\nOld: {}\nNew: {}",
                change.record_type,
                join_or_none(&change.old_values),
                join_or_none(&change.new_values)
            )
        })
        .collect();

    format!(
        "[ALERT] DNS changes detected for {}!\n\n{}",
        domain,
        blocks.join("\n\n")
    )
}

/// Render the answer to a `check` command
pub fn format_check(domain: &str, snapshot: &Snapshot) -> String {
    format!("Current DNS for {}:\n{}", domain, format_snapshot(snapshot))
}

/// Cut `text` to `max_chars` characters and mark it
///
/// Text at or under the ceiling is returned unchanged. Counts characters,
/// not bytes, so multi-byte text is never split inside a character.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Render how long ago the last check ran
///
/// - `None` → `"not yet"`
/// - under 30 seconds → `"just now"`
/// - under an hour → `"N minute(s) ago"`, rounded, at least one
/// - otherwise the absolute UTC time
pub fn relative_time(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "not yet".to_string();
    };

    // Clock skew or a future timestamp counts as "now"
    let elapsed = (now - last).to_std().unwrap_or_default();

    if elapsed < JUST_NOW {
        "just now".to_string()
    } else if elapsed < ABSOLUTE_AFTER {
        let minutes = ((elapsed.as_secs() + 30) / 60).max(1);
        if minutes == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", minutes)
        }
    } else {
        last.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Values shown by the `status` command
#[derive(Debug, Clone)]
pub struct StatusReport<'a> {
    pub domain: &'a str,
    pub poll_interval: Duration,
    pub last_activity: Option<DateTime<Utc>>,
    pub cycles_completed: u64,
    pub alerts_sent: u64,
}

/// Render the answer to a `status` command
pub fn format_status(report: &StatusReport<'_>, now: DateTime<Utc>) -> String {
    format!(
        "🔍 DNS Monitor Status\n\n\
         Domain: {}\n\
         Check Interval: {} seconds\n\
         Last Check: {}\n\
         Checks Completed: {}\n\
         Alerts Sent: {}",
        report.domain,
        report.poll_interval.as_secs(),
        relative_time(report.last_activity, now),
        report.cycles_completed,
        report.alerts_sent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RecordType;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_empty_snapshot_sentinel() {
        assert_eq!(format_snapshot(&Snapshot::new()), NO_RECORDS);
    }

    #[test]
    fn test_snapshot_lines_sorted() {
        let snapshot = Snapshot::new()
            .with_records(RecordType::Ns, ["ns2.example.com.", "ns1.example.com."])
            .with_records(RecordType::A, ["1.2.3.4"]);

        assert_eq!(
            format_snapshot(&snapshot),
            "A: 1.2.3.4\nNS: ns1.example.com. | ns2.example.com."
        );
    }

    #[test]
    fn test_diff_blocks() {
        let changes = vec![
            ChangeRecord {
                record_type: RecordType::A,
                old_values: vec!["1.2.3.4".to_string()],
                new_values: vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()],
            },
            ChangeRecord {
                record_type: RecordType::Mx,
                old_values: vec!["10 mail.example.com.".to_string()],
                new_values: vec![],
            },
        ];

        assert_eq!(
            format_diff("example.com", &changes),
            "[ALERT] DNS changes detected for example.com!\n\n\
             A:\nOld: 1.2.3.4\nNew: 1.2.3.4 | 5.6.7.8\n\n\
             MX:\nOld: 10 mail.example.com.\nNew: None"
        );
    }

    #[test]
    fn test_check_header() {
        let snapshot = Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]);
        assert_eq!(
            format_check("yearn.fi", &snapshot),
            "Current DNS for yearn.fi:\nA: 1.2.3.4"
        );
    }

    #[test]
    fn test_truncate_boundaries() {
        let exact = "x".repeat(10);
        assert_eq!(truncate(&exact, 10), exact);

        let long = "x".repeat(11);
        let cut = truncate(&long, 10);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(cut, format!("{}{}", "x".repeat(10), TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "é".repeat(5);
        assert_eq!(truncate(&text, 5), text);
        assert_eq!(truncate(&text, 3), format!("ééé{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = at(10_000);
        assert_eq!(relative_time(None, now), "not yet");
        assert_eq!(relative_time(Some(at(9_990)), now), "just now");
        assert_eq!(relative_time(Some(at(10_000 - 45)), now), "1 minute ago");
        assert_eq!(relative_time(Some(at(10_000 - 600)), now), "10 minutes ago");
        assert_eq!(relative_time(Some(at(0)), now), "2026-10-16 12:00:00 UTC");
        assert_eq!(relative_time(Some(at(10_005)), now), "just now");
    }

    #[test]
    fn test_status_layout() {
        let report = StatusReport {
            domain: "example.com",
            poll_interval: Duration::from_secs(30),
            last_activity: Some(at(0)),
            cycles_completed: 3,
            alerts_sent: 1,
        };
        let status = format_status(&report, at(5));
        assert_eq!(
            status,
            "🔍 DNS Monitor Status\n\nDomain: example.com\nCheck Interval: 30 seconds\n\
             Last Check: just now\nChecks Completed: 3\nAlerts Sent: 1"
        );
    }
}
