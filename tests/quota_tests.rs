use textock::{
    errors::TextockError,
    models::quota::{
        ENTERPRISE_TIER_LIMIT, FREE_TIER_LIMIT, PREMIUM_TIER_LIMIT, QuotaSnapshot, QuotaTier,
        UsageStatus, current_limit,
    },
};
use tokio_test::{assert_err, assert_ok};

/// Test: The active limit is the free tier
#[test]
fn test_current_limit_is_free_tier() {
    assert_eq!(current_limit(), FREE_TIER_LIMIT);
    assert_eq!(current_limit(), 30);
    assert_eq!(QuotaTier::Premium.limit(), PREMIUM_TIER_LIMIT);
    assert_eq!(QuotaTier::Enterprise.limit(), ENTERPRISE_TIER_LIMIT);
}

/// Test: Reaching the limit leaves nothing remaining
#[test]
fn test_limit_reached_at_capacity() {
    let snapshot = QuotaSnapshot::new(30, 30);

    assert!(snapshot.reached_limit());
    assert_eq!(snapshot.remaining(), 0);
    assert_eq!(snapshot.status(), UsageStatus::Critical);
}

/// Test: Going over the limit never yields a negative remainder
#[test]
fn test_over_limit_floors_remaining() {
    let snapshot = QuotaSnapshot::new(31, 30);

    assert!(snapshot.reached_limit());
    assert_eq!(snapshot.remaining(), 0);
    assert!(snapshot.percentage() > 100.0);
}

/// Test: Status tiers follow the usage percentage thresholds
#[test]
fn test_status_thresholds() {
    let cases = [
        (0, UsageStatus::Normal),
        (17, UsageStatus::Normal),
        (18, UsageStatus::Caution),
        (23, UsageStatus::Caution),
        (24, UsageStatus::Warning),
        (29, UsageStatus::Warning),
        (30, UsageStatus::Critical),
    ];

    for (count, expected) in cases {
        assert_eq!(QuotaSnapshot::new(count, 30).status(), expected, "count {count}");
    }
}

/// Test: Usage messages switch to a countdown near the limit
#[test]
fn test_usage_messages() {
    assert_eq!(QuotaSnapshot::new(10, 30).message(), "10/30 templates in use");
    assert_eq!(QuotaSnapshot::new(25, 30).message(), "5 more templates can be created");
    assert_eq!(QuotaSnapshot::new(30, 30).message(), "Template limit reached (30 templates)");
}

/// Test: Creation is refused at the limit with the limit in the message
#[test]
fn test_ensure_can_create() {
    assert_ok!(QuotaSnapshot::new(29, 30).ensure_can_create());

    let err = assert_err!(QuotaSnapshot::new(30, 30).ensure_can_create());
    assert!(matches!(err, TextockError::QuotaExceeded { limit: 30 }));
    assert!(err.to_string().contains("30"));
    assert!(err.is_input_error());
}

/// Test: Snapshots built from a collection size use the active limit
#[test]
fn test_snapshot_for_count() {
    let snapshot = QuotaSnapshot::for_count(12);

    assert_eq!(snapshot.limit, current_limit());
    assert_eq!(snapshot.remaining(), 18);
    assert!(!snapshot.reached_limit());
}
