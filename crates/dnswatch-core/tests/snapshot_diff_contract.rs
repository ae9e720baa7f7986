//! Contract Test: Snapshot Comparison
//!
//! Verifies what counts as a change.
//!
//! Constraints verified:
//! - A snapshot never differs from itself
//! - Change detection is symmetric
//! - Value order within a record type is irrelevant
//! - A type that appears or disappears is reported against "None"
//! - Rendering is deterministic and bounded
//!
//! If this test fails, someone has made the monitor alert on noise or
//! stay silent on real changes.

use dnswatch_core::format::{self, TRUNCATION_MARKER};
use dnswatch_core::{ChangeRecord, LookupOutcome, RecordType, Snapshot, diff};

fn sample_snapshots() -> Vec<Snapshot> {
    vec![
        Snapshot::new(),
        Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]),
        Snapshot::new().with_records(RecordType::A, ["1.2.3.4", "5.6.7.8"]),
        Snapshot::new()
            .with_records(RecordType::A, ["5.6.7.8", "1.2.3.4"])
            .with_records(RecordType::Mx, ["10 mail.example.com", "20 backup.example.com"]),
        Snapshot::new()
            .with_records(RecordType::Aaaa, ["2606:2800:220:1:248:1893:25c8:1946"])
            .with_records(RecordType::Cname, ["edge.example.net."])
            .with_records(RecordType::Ns, ["a.iana-servers.net.", "b.iana-servers.net."])
            .with_records(RecordType::Txt, ["v=spf1 -all", "google-site-verification=abc"]),
    ]
}

#[test]
fn diff_of_snapshot_with_itself_is_empty() {
    for snapshot in sample_snapshots() {
        assert!(
            diff(&snapshot, &snapshot).is_empty(),
            "diff(S, S) must be empty for {:?}",
            snapshot
        );
    }
}

#[test]
fn change_detection_is_symmetric() {
    let snapshots = sample_snapshots();
    for a in &snapshots {
        for b in &snapshots {
            let forward = diff(a, b);
            let backward = diff(b, a);
            assert_eq!(forward.is_empty(), backward.is_empty());

            // Same types, values swapped
            let swapped: Vec<ChangeRecord> = backward
                .into_iter()
                .map(|c| ChangeRecord {
                    record_type: c.record_type,
                    old_values: c.new_values,
                    new_values: c.old_values,
                })
                .collect();
            assert_eq!(forward, swapped);
        }
    }
}

#[test]
fn value_order_within_type_is_ignored() {
    let old = Snapshot::new().with_records(RecordType::A, ["1.2.3.4", "5.6.7.8"]);
    let new = Snapshot::new().with_records(RecordType::A, ["5.6.7.8", "1.2.3.4"]);
    assert!(diff(&old, &new).is_empty());
}

#[test]
fn appearing_type_is_reported_against_empty_old_values() {
    let old = Snapshot::new();
    let new = Snapshot::new().with_records(RecordType::Cname, ["edge.example.net."]);

    assert_eq!(
        diff(&old, &new),
        vec![ChangeRecord {
            record_type: RecordType::Cname,
            old_values: vec![],
            new_values: vec!["edge.example.net.".to_string()],
        }]
    );
}

#[test]
fn changes_are_ordered_by_record_type() {
    let old = Snapshot::new()
        .with_records(RecordType::Txt, ["a"])
        .with_records(RecordType::A, ["1.1.1.1"])
        .with_records(RecordType::Ns, ["ns1."]);
    let new = Snapshot::new()
        .with_records(RecordType::Txt, ["b"])
        .with_records(RecordType::A, ["2.2.2.2"])
        .with_records(RecordType::Ns, ["ns2."]);

    let types: Vec<RecordType> = diff(&old, &new).iter().map(|c| c.record_type).collect();
    assert_eq!(types, vec![RecordType::A, RecordType::Ns, RecordType::Txt]);

    // Repeated calls agree
    assert_eq!(diff(&old, &new), diff(&old, &new));
}

#[test]
fn scenario_unchanged_a_record() {
    let old = Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]);
    let new = Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]);
    assert!(diff(&old, &new).is_empty());
}

#[test]
fn scenario_added_a_record() {
    let old = Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]);
    let new = Snapshot::new().with_records(RecordType::A, ["1.2.3.4", "5.6.7.8"]);

    assert_eq!(
        diff(&old, &new),
        vec![ChangeRecord {
            record_type: RecordType::A,
            old_values: vec!["1.2.3.4".to_string()],
            new_values: vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()],
        }]
    );
}

#[test]
fn scenario_mx_lookup_starts_failing() {
    let old = Snapshot::new().with_records(RecordType::Mx, ["10 mail.example.com"]);
    let mut new = Snapshot::new();
    new.record(RecordType::Mx, LookupOutcome::Failed("timed out".to_string()));

    let changes = diff(&old, &new);
    assert_eq!(
        changes,
        vec![ChangeRecord {
            record_type: RecordType::Mx,
            old_values: vec!["10 mail.example.com".to_string()],
            new_values: vec![],
        }]
    );

    let alert = format::format_diff("example.com", &changes);
    assert!(alert.contains("MX:\nOld: 10 mail.example.com\nNew: None"));
}

#[test]
fn failed_and_empty_lookups_compare_equal() {
    let mut failed = Snapshot::new();
    failed.record(RecordType::Txt, LookupOutcome::Failed("SERVFAIL".to_string()));
    let mut empty = Snapshot::new();
    empty.record(RecordType::Txt, LookupOutcome::Empty);

    assert!(diff(&failed, &empty).is_empty());
}

#[test]
fn format_snapshot_is_deterministic() {
    for snapshot in sample_snapshots() {
        let first = format::format_snapshot(&snapshot);
        let second = format::format_snapshot(&snapshot.clone());
        assert_eq!(first, second);
    }

    // Insertion and value order do not leak into the output
    let a = Snapshot::new()
        .with_records(RecordType::Txt, ["b", "a"])
        .with_records(RecordType::A, ["1.2.3.4"]);
    let b = Snapshot::new()
        .with_records(RecordType::A, ["1.2.3.4"])
        .with_records(RecordType::Txt, ["a", "b"]);
    assert_eq!(format::format_snapshot(&a), format::format_snapshot(&b));
}

#[test]
fn oversized_alert_is_truncated_with_marker() {
    let values: Vec<String> = (0..500).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
    let old = Snapshot::new();
    let new = Snapshot::new().with_records(RecordType::A, values);

    let alert = format::format_diff("example.com", &diff(&old, &new));
    assert!(alert.chars().count() > 4000);

    let bounded = format::truncate(&alert, 4000);
    assert!(bounded.ends_with(TRUNCATION_MARKER));
    assert_eq!(bounded.chars().count(), 4000 + TRUNCATION_MARKER.chars().count());
}

#[test]
fn short_alert_is_not_truncated() {
    let old = Snapshot::new().with_records(RecordType::A, ["1.2.3.4"]);
    let new = Snapshot::new().with_records(RecordType::A, ["5.6.7.8"]);

    let alert = format::format_diff("example.com", &diff(&old, &new));
    assert_eq!(format::truncate(&alert, 4000), alert);
}
