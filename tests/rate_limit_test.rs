mod common;

use std::sync::Arc;

use movemycar_dispatch::{
    InMemoryStorage, LogKind, NotificationLogEntry, RateLimitConfig, RateLimiter, Storage,
    TargetId,
};

use common::seed_notify_entries;

async fn limiter_with(entries: &[NotificationLogEntry]) -> RateLimiter {
    let storage = Arc::new(InMemoryStorage::new());
    for entry in entries {
        storage.append_log_entry(entry).await.unwrap();
    }
    RateLimiter::new(storage, RateLimitConfig::default())
}

#[tokio::test]
async fn test_sixth_attempt_in_window_is_denied() {
    let storage = Arc::new(InMemoryStorage::new());
    let limiter = RateLimiter::new(storage.clone(), RateLimitConfig::default());
    let target = TargetId::new("vehicle-1");

    for attempt in 1..=5 {
        assert!(
            limiter.allow(&target, 300, 5).await.unwrap(),
            "attempt {attempt} should pass"
        );
        let entry = NotificationLogEntry::now(target.clone(), LogKind::Notify, None);
        storage.append_log_entry(&entry).await.unwrap();
    }

    assert!(!limiter.allow(&target, 300, 5).await.unwrap());
}

#[tokio::test]
async fn test_entry_older_than_window_does_not_count() {
    let target = TargetId::new("vehicle-2");
    // Four recent attempts plus one from 301 seconds ago.
    let limiter = limiter_with(&seed_notify_entries(&target, &[10, 20, 30, 40, 301])).await;

    assert!(limiter.allow(&target, 300, 5).await.unwrap());
    let snapshot = limiter.check(&target).await.unwrap();
    assert_eq!(snapshot.count, 4);
    assert_eq!(snapshot.remaining(), 1);
}

#[tokio::test]
async fn test_windows_are_per_target() {
    let busy = TargetId::new("busy");
    let quiet = TargetId::new("quiet");
    let limiter = limiter_with(&seed_notify_entries(&busy, &[1, 2, 3, 4, 5])).await;

    assert!(!limiter.allow(&busy, 300, 5).await.unwrap());
    assert!(limiter.allow(&quiet, 300, 5).await.unwrap());
}

#[tokio::test]
async fn test_threshold_and_window_are_inputs() {
    let target = TargetId::new("vehicle-3");
    let limiter = limiter_with(&seed_notify_entries(&target, &[30, 90])).await;

    assert!(!limiter.allow(&target, 300, 2).await.unwrap());
    assert!(limiter.allow(&target, 300, 3).await.unwrap());
    // Only the 30s-old entry falls inside a one-minute window.
    assert!(limiter.allow(&target, 60, 2).await.unwrap());
    assert!(!limiter.allow(&target, 60, 1).await.unwrap());
}

#[tokio::test]
async fn test_zero_max_attempts_denies_everything() {
    let target = TargetId::new("vehicle-4");
    let limiter = limiter_with(&[]).await;
    assert!(!limiter.allow(&target, 300, 0).await.unwrap());
}
