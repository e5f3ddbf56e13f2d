//! Contract Test: Fail-fast on Transport Errors
//!
//! Constraints verified:
//! - A provider transport error aborts the run
//! - Work completed before the failure stays logged
//! - Nothing after the failing call is attempted

mod common;

use common::*;
use ddns_core::config::RecordType;
use ddns_core::traits::IpFamily;
use ddns_core::Error;
use tempfile::tempdir;

#[tokio::test]
async fn transport_error_aborts_remaining_records_and_families() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("ddns.log");
    let provider = example_provider()
        .with_record("zone1", RecordType::A, "www.example.com", "rec3", "203.0.113.9")
        .failing_on_record("home.example.com");

    let reconciler = reconciler(
        &provider,
        &log_path,
        domains([zone("example.com", &["@", "home", "www"])]),
    );

    let result = reconciler
        .run(&[
            StaticIpSource::found(IpFamily::V4, "203.0.113.5"),
            StaticIpSource::found(IpFamily::V6, "2001:db8::5"),
        ])
        .await;

    let err = result.expect_err("transport failure must abort the run");
    assert!(matches!(err, Error::Provider { .. }));

    // example.com was updated before the failure and stays logged
    let lines = log_lines(&log_path);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" A: example.com updated to: 203.0.113.5"));

    // www.example.com and the AAAA pass were never attempted
    let touched_www = provider.calls().iter().any(|call| {
        matches!(call, ProviderCall::ResolveRecord { name, .. } if name == "www.example.com")
    });
    assert!(!touched_www);
    assert_eq!(provider.calls_for_type(RecordType::Aaaa), 0);
}
