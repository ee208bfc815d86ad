//! WriteCoordinator: write-through durability, per-document coalescing,
//! dedup, quota handling, and flushing of pending saves.

mod common;

use std::time::Duration;

use common::{key, network_failure, past_debounce, quota_failure, Harness, DEBOUNCE};
use proptest::prelude::*;
use rollbook_core::errors::{RemoteErrorKind, RollbookError};
use rollbook_core::models::{RecordSource, SaveOptions};
use rollbook_sync::WriteCoordinator;
use serde_json::{json, Value};

#[tokio::test(start_paused = true)]
async fn debounced_save_is_durable_before_any_remote_write() {
    let h = Harness::new();
    let writer = h.writer();

    let confirmed = writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::debounced())
        .await
        .unwrap();

    assert!(!confirmed);
    assert_eq!(h.remote.write_count(), 0);
    assert!(writer.has_pending(&key("d1")));
    let record = h.cache.record(&key("d1")).unwrap();
    assert_eq!(record.data, json!({"a": 1}));
    assert_eq!(record.source, RecordSource::Local);

    past_debounce().await;
    assert_eq!(h.remote.write_count(), 1);
    assert_eq!(h.remote.document("dashboards", "d1"), Some(json!({"a": 1})));
    assert!(h.cache.record(&key("d1")).unwrap().is_remote());
    assert!(!writer.has_pending(&key("d1")));
}

#[tokio::test(start_paused = true)]
async fn rapid_saves_coalesce_into_one_write_of_the_last_payload() {
    let h = Harness::new();
    let writer = h.writer();

    for n in 1..=3 {
        writer
            .save(&key("d1"), json!({"p": n}), SaveOptions::debounced())
            .await
            .unwrap();
        assert_eq!(h.cache.get(&key("d1")), Some(json!({"p": n})));
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    assert_eq!(h.remote.write_count(), 0);

    // The window restarts with every save.
    tokio::time::sleep(DEBOUNCE - Duration::from_secs(4)).await;
    assert_eq!(h.remote.write_count(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.remote.write_count(), 1);
    assert_eq!(h.remote.document("dashboards", "d1"), Some(json!({"p": 3})));
}

#[tokio::test(start_paused = true)]
async fn pending_saves_are_tracked_per_document() {
    let h = Harness::new();
    let writer = h.writer();

    writer
        .save(&key("a"), json!({"doc": "a"}), SaveOptions::debounced())
        .await
        .unwrap();
    writer
        .save(&key("b"), json!({"doc": "b"}), SaveOptions::debounced())
        .await
        .unwrap();
    assert_eq!(writer.pending_count(), 2);

    past_debounce().await;
    assert_eq!(h.remote.write_count(), 2);
    assert_eq!(h.remote.document("dashboards", "a"), Some(json!({"doc": "a"})));
    assert_eq!(h.remote.document("dashboards", "b"), Some(json!({"doc": "b"})));
    assert_eq!(writer.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn immediate_save_writes_now_and_confirms() {
    let h = Harness::new();
    let writer = h.writer();

    let confirmed = writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::immediate())
        .await
        .unwrap();

    assert!(confirmed);
    assert_eq!(h.remote.write_count(), 1);
    assert!(h.cache.record(&key("d1")).unwrap().is_remote());
}

#[tokio::test(start_paused = true)]
async fn immediate_save_replaces_pending_debounced_save() {
    let h = Harness::new();
    let writer = h.writer();

    writer
        .save(&key("d1"), json!({"v": 1}), SaveOptions::debounced())
        .await
        .unwrap();
    writer
        .save(&key("d1"), json!({"v": 2}), SaveOptions::immediate())
        .await
        .unwrap();
    assert!(!writer.has_pending(&key("d1")));

    past_debounce().await;
    assert_eq!(h.remote.write_count(), 1);
    assert_eq!(h.remote.document("dashboards", "d1"), Some(json!({"v": 2})));
}

#[tokio::test(start_paused = true)]
async fn identical_payload_is_written_once() {
    let h = Harness::new();
    let writer = h.writer();
    let payload = json!({"a": 1});

    assert!(writer
        .save(&key("d1"), payload.clone(), SaveOptions::immediate())
        .await
        .unwrap());
    assert!(writer
        .save(&key("d1"), payload.clone(), SaveOptions::immediate())
        .await
        .unwrap());
    writer
        .save(&key("d1"), payload, SaveOptions::debounced())
        .await
        .unwrap();
    past_debounce().await;

    assert_eq!(h.remote.write_count(), 1);
    assert!(h.cache.record(&key("d1")).unwrap().is_remote());
}

#[tokio::test(start_paused = true)]
async fn immediate_transient_failure_is_returned_and_local_copy_kept() {
    let h = Harness::new();
    let writer = h.writer();
    h.remote.fail_next_write(network_failure());

    let err = writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::immediate())
        .await
        .unwrap_err();

    match err {
        RollbookError::Remote(e) => assert_eq!(e.kind, RemoteErrorKind::Transient),
        other => panic!("expected remote error, got {other:?}"),
    }
    let record = h.cache.record(&key("d1")).unwrap();
    assert_eq!(record.data, json!({"a": 1}));
    assert_eq!(record.source, RecordSource::Local);
    assert!(!h.quota.is_cooling_down());
}

#[tokio::test(start_paused = true)]
async fn debounced_transient_failure_leaves_record_local() {
    let h = Harness::new();
    let writer = h.writer();
    h.remote.fail_next_write(network_failure());

    writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::debounced())
        .await
        .unwrap();
    past_debounce().await;

    assert_eq!(h.remote.write_count(), 1);
    assert_eq!(h.cache.record(&key("d1")).unwrap().source, RecordSource::Local);
    assert!(!writer.has_pending(&key("d1")));
}

#[tokio::test(start_paused = true)]
async fn quota_failure_is_silent_and_starts_cooldown() {
    let h = Harness::new();
    let writer = h.writer();
    h.remote.fail_next_write(quota_failure());

    let confirmed = writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::immediate())
        .await
        .unwrap();

    assert!(!confirmed);
    assert!(h.quota.is_cooling_down());
    assert_eq!(h.cache.get(&key("d1")), Some(json!({"a": 1})));
}

#[tokio::test(start_paused = true)]
async fn debounced_save_during_cooldown_stays_local() {
    let h = Harness::new();
    let writer = h.writer();
    h.quota.record_quota_failure();

    writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::debounced())
        .await
        .unwrap();
    past_debounce().await;

    assert_eq!(h.remote.write_count(), 0);
    assert_eq!(h.cache.record(&key("d1")).unwrap().source, RecordSource::Local);
}

#[tokio::test(start_paused = true)]
async fn immediate_save_bypasses_cooldown_and_clears_it() {
    let h = Harness::new();
    let writer = h.writer();
    h.quota.record_quota_failure();

    let confirmed = writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::immediate())
        .await
        .unwrap();

    assert!(confirmed);
    assert_eq!(h.remote.write_count(), 1);
    assert!(!h.quota.is_cooling_down());
}

#[tokio::test(start_paused = true)]
async fn newer_local_value_is_not_retagged_by_older_write() {
    let h = Harness::new();
    let writer = h.writer();
    h.remote.set_latency(Some(Duration::from_secs(1)));

    let in_flight = {
        let writer = writer.clone();
        tokio::spawn(async move {
            writer
                .save(&key("d1"), json!({"v": 1}), SaveOptions::immediate())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    writer
        .save(&key("d1"), json!({"v": 2}), SaveOptions::debounced())
        .await
        .unwrap();

    assert!(in_flight.await.unwrap().unwrap());
    let record = h.cache.record(&key("d1")).unwrap();
    assert_eq!(record.data, json!({"v": 2}));
    assert_eq!(record.source, RecordSource::Local);

    tokio::time::sleep(DEBOUNCE + Duration::from_secs(2)).await;
    assert_eq!(h.remote.document("dashboards", "d1"), Some(json!({"v": 2})));
    assert!(h.cache.record(&key("d1")).unwrap().is_remote());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retags_never_roll_back_the_latest_save() {
    let h = Harness::new();
    let writer = WriteCoordinator::new(
        h.cache.clone(),
        h.quota.clone(),
        h.adapter.clone(),
        Duration::from_millis(1),
    );

    for rev in 0..300 {
        let payload = json!({"rev": rev});
        let options = if rev % 7 == 0 {
            SaveOptions::immediate()
        } else {
            SaveOptions::debounced()
        };
        writer.save(&key("d1"), payload.clone(), options).await.unwrap();
        // Timers from earlier saves retag in the background while this runs.
        assert_eq!(h.cache.get(&key("d1")), Some(payload));
        if rev % 10 == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    writer.flush_all().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.cache.get(&key("d1")), Some(json!({"rev": 299})));
    assert_eq!(writer.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mark_remote_racing_a_newer_save_keeps_the_newer_payload() {
    let h = Harness::new();
    let older = json!({"rev": 1});
    let newer = json!({"rev": 2});

    for _ in 0..300 {
        h.cache.put(&key("d1"), &older, RecordSource::Local);
        let retag = {
            let cache = h.cache.clone();
            let older = older.clone();
            tokio::spawn(async move { cache.mark_remote(&key("d1"), &older) })
        };
        let save = {
            let cache = h.cache.clone();
            let newer = newer.clone();
            tokio::spawn(async move { cache.put_local(&key("d1"), &newer) })
        };
        retag.await.unwrap();
        assert!(save.await.unwrap());

        let record = h.cache.record(&key("d1")).unwrap();
        assert_eq!(record.data, newer);
        assert_eq!(record.source, RecordSource::Local);
    }
}

#[tokio::test(start_paused = true)]
async fn flush_sends_pending_save_now() {
    let h = Harness::new();
    let writer = h.writer();

    assert!(writer.flush(&key("d1")).await.is_none());

    writer
        .save(&key("d1"), json!({"a": 1}), SaveOptions::debounced())
        .await
        .unwrap();
    let outcome = writer.flush(&key("d1")).await.unwrap();
    assert!(outcome.unwrap());
    assert_eq!(h.remote.write_count(), 1);
    assert!(!writer.has_pending(&key("d1")));

    past_debounce().await;
    assert_eq!(h.remote.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn flush_all_reports_each_document_in_key_order() {
    let h = Harness::new();
    let writer = h.writer();
    for id in ["c", "a", "b"] {
        writer
            .save(&key(id), json!({"id": id}), SaveOptions::debounced())
            .await
            .unwrap();
    }
    h.remote.fail_next_write(network_failure());

    let results = writer.flush_all().await;
    let ids: Vec<&str> = results.iter().map(|(k, _)| k.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert!(results[0].1.is_err());
    assert!(results[1].1.as_ref().is_ok_and(|confirmed| *confirmed));
    assert_eq!(writer.pending_count(), 0);
}

fn payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!({ "n": n })),
        "[a-z]{0,8}".prop_map(|s| json!({ "s": s })),
        Just(json!({"fixed": true})),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Save { doc: usize, data: Value, immediate: bool, fail: bool },
    Wait(u64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0usize..3, payload(), any::<bool>(), any::<bool>())
            .prop_map(|(doc, data, immediate, fail)| Step::Save { doc, data, immediate, fail }),
        1 => (0u64..15).prop_map(Step::Wait),
    ]
}

proptest! {
    #[test]
    fn cache_always_holds_the_last_saved_payload(steps in prop::collection::vec(step(), 1..25)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();
        runtime.block_on(async {
            let h = Harness::new();
            let writer = h.writer();
            for step in steps {
                match step {
                    Step::Save { doc, data, immediate, fail } => {
                        if fail {
                            h.remote.fail_next_write(network_failure());
                        }
                        let id = format!("doc-{doc}");
                        let options = if immediate {
                            SaveOptions::immediate()
                        } else {
                            SaveOptions::debounced()
                        };
                        let _ = writer.save(&key(&id), data.clone(), options).await;
                        assert_eq!(h.cache.get(&key(&id)), Some(data));
                    }
                    Step::Wait(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                }
            }
        });
    }
}
