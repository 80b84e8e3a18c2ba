#![allow(clippy::unwrap_used)]
// Controller protocol tests: scripted collaborators, paused clock.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::Instant;

use biocfg_core::{
    Biotype, ChangeOutcome, CoreError, DeviceId, RestartDecision, ResultCode, StatusResponse,
    SyncConfig,
};
use common::{Harness, config, device, ready};

const FP: i32 = 0;
const FV: i32 = 1;
const IRIS: i32 = 2;

fn fingerprint(h: &Harness, name: &str) -> biocfg_core::DeviceRecord {
    h.controller
        .inventory()
        .find_by_name(Biotype::FingerPrint, name)
        .unwrap()
}

// ── Enable path ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_fp1_enable_end_to_end() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service()
        .script_statuses([Some(StatusResponse::NotReady), Some(ready(1))]);
    h.clear_calls();

    let fp1 = fingerprint(&h, "FP1");
    let started = Instant::now();
    let outcome = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::Applied { available: 1 });
    assert_eq!(
        h.calls(),
        vec![
            "driver enable FP1",
            "prompt enable FP1",
            "restart",
            "list",
            "status 7",
            "status 7",
        ]
    );
    assert_eq!(fingerprint(&h, "FP1").available, 1);
    // Grace period plus one backoff.
    assert!(started.elapsed() >= Duration::from_millis(3200));
}

#[tokio::test(start_paused = true)]
async fn test_poll_terminates_after_n_not_ready() {
    const NOT_READY: usize = 5;
    let h = Harness::new(vec![device(3, IRIS, "IR1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service()
        .script_statuses(std::iter::repeat_n(Some(StatusResponse::NotReady), NOT_READY));
    h.service().script_statuses([Some(ready(1))]);

    let ir1 = h
        .controller
        .inventory()
        .find_by_name(Biotype::Iris, "IR1")
        .unwrap();
    let outcome = h
        .controller
        .change_device_status(&ir1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::Applied { available: 1 });
    assert_eq!(h.calls_matching("status").len(), NOT_READY + 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_are_retried() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service().script_statuses([None, None, Some(ready(2))]);

    let fp1 = fingerprint(&h, "FP1");
    let outcome = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::Applied { available: 2 });
    assert_eq!(h.calls_matching("status").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_no_such_device_reports_not_connected() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service().script_statuses([Some(StatusResponse::Ready {
        result: ResultCode::NoSuchDevice,
        available: 1,
    })]);

    let fp1 = fingerprint(&h, "FP1");
    let err = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::DeviceNotConnected { ref name } if name == "FP1"),
        "got {err:?}"
    );
    // Availability stays at whatever the refresh produced.
    assert_eq!(fingerprint(&h, "FP1").available, 0);
}

#[tokio::test(start_paused = true)]
async fn test_poll_uses_fresh_id_after_restart() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    let stale = fingerprint(&h, "FP1");

    // The restarted service renumbers its devices.
    h.service().set_devices(vec![device(12, FP, "FP1", 0)]);
    let outcome = h
        .controller
        .change_device_status(&stale, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::Applied { available: 1 });
    assert_eq!(h.calls_matching("status"), vec!["status 12"]);
    assert_eq!(fingerprint(&h, "FP1").id, DeviceId(12));
}

#[tokio::test(start_paused = true)]
async fn test_poll_cap_yields_timeout() {
    let config = SyncConfig {
        max_status_polls: Some(3),
        ..config()
    };
    let h = Harness::with_config(config, vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service()
        .script_statuses(std::iter::repeat_n(Some(StatusResponse::NotReady), 10));

    let fp1 = fingerprint(&h, "FP1");
    let err = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Timeout { attempts: 3 }), "got {err:?}");
    assert_eq!(h.calls_matching("status").len(), 3);
}

// ── Disable path ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_disable_sets_zero_without_polling() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1)]);
    h.controller.refresh().await.unwrap();

    let fp1 = fingerprint(&h, "FP1");
    let outcome = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::Applied { available: 0 });
    assert!(h.calls_matching("status").is_empty());
    assert_eq!(h.calls_matching("driver"), vec!["driver disable FP1"]);
    // The refreshed list still says available; the disable path wins.
    assert_eq!(fingerprint(&h, "FP1").available, 0);
}

// ── Helper and restart failures ─────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_driver_helper_failure_stops_before_restart() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.clear_calls();
    *h.runner().driver_exit.lock().unwrap() = Some(1);

    let fp1 = h
        .controller
        .inventory()
        .find_by_id(DeviceId(7))
        .unwrap();
    let err = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::ChangeRejected { code: Some(1), .. }),
        "got {err:?}"
    );
    assert_eq!(h.calls(), vec!["driver enable FP1"]);
    assert_eq!(h.controller.inventory().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_later_skips_refresh() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.clear_calls();

    let fp1 = fingerprint(&h, "FP1");
    let outcome = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Later))
        .await
        .unwrap();

    assert_eq!(outcome, ChangeOutcome::PendingRestart);
    assert_eq!(h.calls(), vec!["driver enable FP1", "prompt enable FP1"]);
    assert_eq!(fingerprint(&h, "FP1").available, 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_failure_stops_before_refresh() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    *h.manager().fail.lock().unwrap() = true;
    h.clear_calls();

    let fp1 = fingerprint(&h, "FP1");
    let err = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::RestartFailed { .. }), "got {err:?}");
    assert_eq!(
        h.calls(),
        vec!["driver enable FP1", "prompt enable FP1", "restart"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_after_restart_is_not_fatal() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    h.service().fail_fetch();

    let fp1 = fingerprint(&h, "FP1");
    let outcome = h
        .controller
        .change_device_status(&fp1, &h.prompt(RestartDecision::Now))
        .await
        .unwrap();

    // Device vanished with the failed fetch: the stale id is polled and
    // the availability update has nothing to land on.
    assert_eq!(outcome, ChangeOutcome::Applied { available: 1 });
    assert_eq!(h.calls_matching("status"), vec!["status 7"]);
    assert!(h.controller.inventory().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restart_and_refresh_waits_grace_period() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0), device(8, FV, "FV1", 1)]);
    let started = Instant::now();

    let count = h.controller.restart_and_refresh().await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(h.calls(), vec!["restart", "list"]);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(h.controller.inventory().last_refresh().is_some());
}

// ── Serialization ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_changes_to_same_device_are_serialized() {
    let h = Harness::with_driver_delay(vec![device(7, FP, "FP1", 0)], Duration::from_secs(1));
    h.controller.refresh().await.unwrap();
    h.clear_calls();
    let fp1 = fingerprint(&h, "FP1");

    let first = {
        let controller = std::sync::Arc::clone(&h.controller);
        let device = fp1.clone();
        tokio::spawn(async move {
            controller
                .change_device_status(&device, &biocfg_core::FixedPrompt(RestartDecision::Later))
                .await
        })
    };
    let second = {
        let controller = std::sync::Arc::clone(&h.controller);
        let device = fp1.clone();
        tokio::spawn(async move {
            controller
                .change_device_status(&device, &biocfg_core::FixedPrompt(RestartDecision::Later))
                .await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(
        h.calls(),
        vec![
            "driver enable FP1",
            "driver done FP1",
            "driver enable FP1",
            "driver done FP1",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_same_device_stays_serialized_when_id_changes() {
    let h = Harness::new(vec![device(7, FP, "FP1", 0)]);
    h.controller.refresh().await.unwrap();
    let stale = fingerprint(&h, "FP1");
    h.service().set_devices(vec![device(8, FP, "FP1", 0)]);
    h.service()
        .script_statuses(std::iter::repeat_n(Some(StatusResponse::NotReady), 50));
    h.clear_calls();

    let first = {
        let controller = std::sync::Arc::clone(&h.controller);
        tokio::spawn(async move {
            controller
                .change_device_status(&stale, &biocfg_core::FixedPrompt(RestartDecision::Now))
                .await
        })
    };

    // Past the grace period: refreshed, still polling.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    let fresh = fingerprint(&h, "FP1");
    assert_eq!(fresh.id, DeviceId(8));
    assert!(!first.is_finished());

    let second = {
        let controller = std::sync::Arc::clone(&h.controller);
        tokio::spawn(async move {
            controller
                .change_device_status(&fresh, &biocfg_core::FixedPrompt(RestartDecision::Later))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!second.is_finished());
    assert_eq!(h.calls_matching("driver"), vec!["driver enable FP1"]);

    assert_eq!(
        first.await.unwrap().unwrap(),
        ChangeOutcome::Applied { available: 1 }
    );
    second.await.unwrap().unwrap();

    let calls = h.calls();
    let last_poll = calls.iter().rposition(|c| c == "status 8").unwrap();
    let second_driver = calls.iter().rposition(|c| c.starts_with("driver")).unwrap();
    assert!(second_driver > last_poll, "calls: {calls:?}");
    assert_eq!(h.calls_matching("driver").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_changes_to_different_devices_interleave() {
    let h = Harness::with_driver_delay(
        vec![device(7, FP, "FP1", 0), device(8, FP, "FP2", 0)],
        Duration::from_secs(1),
    );
    h.controller.refresh().await.unwrap();
    h.clear_calls();

    let handles: Vec<_> = ["FP1", "FP2"]
        .into_iter()
        .map(|name| {
            let controller = std::sync::Arc::clone(&h.controller);
            let device = fingerprint(&h, name);
            tokio::spawn(async move {
                controller
                    .change_device_status(
                        &device,
                        &biocfg_core::FixedPrompt(RestartDecision::Later),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let calls = h.calls();
    assert_eq!(calls.len(), 4);
    // Both helpers start before either finishes.
    assert!(calls[0].starts_with("driver enable"));
    assert!(calls[1].starts_with("driver enable"));
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_start_loads_inventory_and_probes_verification() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1), device(9, IRIS, "IR1", 0)]);
    *h.runner().status_output.lock().unwrap() = Some("Biometric authentication is ENABLED\n".into());

    let count = h.controller.start().await.unwrap();

    assert_eq!(count, 2);
    assert!(h.controller.verification().enabled);
    assert_eq!(h.calls(), vec!["exists", "api 0.11.1", "probe", "list"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_when_service_missing() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1)]);
    *h.service().exists.lock().unwrap() = Some(false);

    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, CoreError::ServiceNotRunning { .. }), "got {err:?}");
    assert!(err.is_fatal());
    assert_eq!(h.calls(), vec!["exists"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_when_presence_check_errors() {
    let h = Harness::new(vec![]);
    *h.service().exists.lock().unwrap() = None;

    let err = h.controller.start().await.unwrap_err();
    assert!(err.is_fatal(), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn test_start_fails_on_incompatible_api() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1)]);
    *h.service().api_compatible.lock().unwrap() = false;

    let err = h.controller.start().await.unwrap_err();

    assert!(matches!(err, CoreError::IncompatibleApi { .. }), "got {err:?}");
    assert!(err.is_fatal());
    assert!(h.calls_matching("list").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_tolerates_fetch_failure_and_probe_failure() {
    let h = Harness::new(vec![]);
    h.service().fail_fetch();
    *h.runner().status_output.lock().unwrap() = None;

    let count = h.controller.start().await.unwrap();

    assert_eq!(count, 0);
    assert!(h.controller.inventory().is_empty());
    assert!(!h.controller.verification().enabled);
}

// ── Verification ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_enable_verification_requires_enrolled_features() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1), device(9, IRIS, "IR1", 1)]);
    h.controller.refresh().await.unwrap();
    h.clear_calls();

    let err = h.controller.set_verification_enabled(true).await.unwrap_err();

    assert!(matches!(err, CoreError::NoFeaturesEnrolled), "got {err:?}");
    assert!(h.calls_matching("verification").is_empty());
    assert_eq!(
        h.calls_matching("features"),
        vec!["features 7 1000", "features 9 1000"]
    );
    assert!(!h.controller.verification().enabled);
}

#[tokio::test(start_paused = true)]
async fn test_feature_count_failure_counts_as_zero() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1), device(9, IRIS, "IR1", 1)]);
    h.controller.refresh().await.unwrap();
    h.service().set_features(7, None);
    h.service().set_features(9, Some(2));

    assert_eq!(h.controller.enrolled_feature_total().await, 2);
    let state = h.controller.set_verification_enabled(true).await.unwrap();

    assert!(state.enabled);
    assert_eq!(h.calls_matching("verification"), vec!["verification enable alice"]);
    assert!(h.controller.verification().enabled);
}

#[tokio::test(start_paused = true)]
async fn test_device_feature_count_uses_configured_uid() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1), device(9, IRIS, "IR1", 1)]);
    h.controller.refresh().await.unwrap();
    h.service().set_features(7, Some(3));
    h.clear_calls();

    let fp1 = fingerprint(&h, "FP1");
    assert_eq!(h.controller.device_feature_count(&fp1).await.unwrap(), 3);
    assert_eq!(h.calls(), vec!["features 7 1000"]);

    h.service().set_features(7, None);
    assert!(h.controller.device_feature_count(&fp1).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_verification_subscribers_see_toggles() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1)]);
    h.controller.refresh().await.unwrap();
    h.service().set_features(7, Some(1));
    let mut rx = h.controller.subscribe_verification();
    assert!(!rx.borrow_and_update().enabled);

    h.controller.set_verification_enabled(true).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().enabled);

    h.controller.set_verification_enabled(false).await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status_text(), "Closed");
}

#[tokio::test(start_paused = true)]
async fn test_disable_verification_skips_feature_check() {
    let h = Harness::new(vec![]);

    let state = h.controller.set_verification_enabled(false).await.unwrap();

    assert!(!state.enabled);
    assert!(h.calls_matching("features").is_empty());
    assert_eq!(h.calls(), vec!["verification disable alice"]);
}

#[tokio::test(start_paused = true)]
async fn test_verification_helper_failure_keeps_state() {
    let h = Harness::new(vec![device(7, FP, "FP1", 1)]);
    h.controller.refresh().await.unwrap();
    h.service().set_features(7, Some(1));
    *h.runner().verification_exit.lock().unwrap() = Some(126);

    let err = h.controller.set_verification_enabled(true).await.unwrap_err();

    assert!(
        matches!(err, CoreError::ChangeRejected { code: Some(126), .. }),
        "got {err:?}"
    );
    assert!(!h.controller.verification().enabled);
}

// ── Summary ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_summary_covers_all_groups() {
    let h = Harness::new(vec![
        device(1, FP, "FP1", 1),
        device(2, FP, "FP2", 0),
        device(3, IRIS, "IR1", 1),
    ]);
    h.controller.refresh().await.unwrap();

    let summary = h.controller.summary();

    assert_eq!(summary.groups.len(), 4);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.available(), 2);
    let fp = &summary.groups[0];
    assert_eq!(fp.biotype, Biotype::FingerPrint);
    assert_eq!(
        fp.devices,
        vec![("FP1".to_owned(), true), ("FP2".to_owned(), false)]
    );
    assert_eq!(summary.groups[1].total, 0);
}
