//! End-to-end seed scenarios against a live Postgres database. Skipped
//! unless `DATABASE_URL` (or `PRIMARY_DATABASE_URL`) is set — these are not
//! safe to run against an in-memory fake since the guarantees under test
//! (`FOR UPDATE SKIP LOCKED` disjointness, transactional claim/update) are
//! properties of the real database, not of this crate's own code.

use std::thread;

use serde_json::json;
use wq_db::DatabaseManager;
use wq_processor::DistributedProcessor;

fn live_primary() -> Option<DatabaseManager> {
    if std::env::var("DATABASE_URL").is_err() && std::env::var("PRIMARY_DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    }
    DatabaseManager::new("primary").ok()
}

fn unique_flow(label: &str) -> String {
    format!("it-{label}-{}", uuid::Uuid::new_v4())
}

#[test]
fn two_workers_ten_records_fifo_and_disjointness() {
    let Some(primary) = live_primary() else { return };
    let flow = unique_flow("fifo");
    let seed = DistributedProcessor::new("seed", primary);
    let payloads: Vec<_> = (0..10).map(|i| json!({"seq": i})).collect();
    seed.add_records_to_queue(&flow, payloads).expect("seed insert");

    let worker_a = DistributedProcessor::new("worker-a", DatabaseManager::new("primary").unwrap());
    let worker_b = DistributedProcessor::new("worker-b", DatabaseManager::new("primary").unwrap());

    let flow_a = flow.clone();
    let handle_a = thread::spawn(move || worker_a.claim_records_batch(&flow_a, 6).expect("claim A"));
    let flow_b = flow.clone();
    let handle_b = thread::spawn(move || worker_b.claim_records_batch(&flow_b, 6).expect("claim B"));

    let claimed_a = handle_a.join().unwrap();
    let claimed_b = handle_b.join().unwrap();

    assert_eq!(claimed_a.len() + claimed_b.len(), 10, "every record claimed exactly once across both workers");

    let ids_a: std::collections::HashSet<_> = claimed_a.iter().map(|r| r.id).collect();
    let ids_b: std::collections::HashSet<_> = claimed_b.iter().map(|r| r.id).collect();
    assert!(ids_a.is_disjoint(&ids_b), "claim disjointness: no id appears in both batches");

    for batch in [&claimed_a, &claimed_b] {
        let mut created_ats: Vec<_> = batch.iter().map(|r| r.created_at).collect();
        let mut sorted = created_ats.clone();
        sorted.sort();
        created_ats.dedup();
        assert_eq!(created_ats.len(), batch.len());
        assert_eq!(batch.iter().map(|r| r.created_at).collect::<Vec<_>>(), sorted, "FIFO within batch");
    }
}

#[test]
fn crash_and_recover_returns_orphan_to_pending() {
    let Some(primary) = live_primary() else { return };
    let flow = unique_flow("crash");
    let processor = DistributedProcessor::new("crash-test", primary);
    processor.add_records_to_queue(&flow, vec![json!({"n": 42})]).expect("seed");

    let claimed = processor.claim_records_batch(&flow, 1).expect("claim");
    assert_eq!(claimed.len(), 1);
    // Simulate the claimer dying before it marks the record: `claimed_at`
    // is already in the past relative to `timeout_hours=0`.
    let reclaimed = processor.cleanup_orphaned_records(0).expect("cleanup");
    assert!(reclaimed >= 1);

    let next_claim = DistributedProcessor::new("recoverer", DatabaseManager::new("primary").unwrap())
        .claim_records_batch(&flow, 1)
        .expect("reclaim");
    assert_eq!(next_claim.len(), 1);
    assert_eq!(next_claim[0].id, claimed[0].id);
}

#[test]
fn late_completion_after_reclaim_is_a_silent_no_op() {
    let Some(primary) = live_primary() else { return };
    let flow = unique_flow("late");
    let worker_a = DistributedProcessor::new("worker-a", primary);
    worker_a.add_records_to_queue(&flow, vec![json!({"k": 7})]).expect("seed");

    let claimed_a = worker_a.claim_records_batch(&flow, 1).expect("claim A");
    assert_eq!(claimed_a.len(), 1);
    let id = claimed_a[0].id;

    worker_a.cleanup_orphaned_records(0).expect("orphan recovery reclaims A's row");

    let worker_b = DistributedProcessor::new("worker-b", DatabaseManager::new("primary").unwrap());
    let claimed_b = worker_b.claim_records_batch(&flow, 1).expect("claim B");
    assert_eq!(claimed_b.len(), 1);
    worker_b.mark_record_completed(id, json!({"ok": true})).expect("B completes");

    let applied = worker_a.mark_record_completed(id, json!({"stale": true})).expect("A's late call does not error");
    assert!(!applied, "A's completion is a no-op since the row is no longer owned by A");
}

#[test]
fn retry_exhaustion_leaves_record_failed_and_reset_is_a_no_op() {
    let Some(primary) = live_primary() else { return };
    let flow = unique_flow("retry");
    let processor = DistributedProcessor::new("retry-test", primary);
    processor.add_records_to_queue(&flow, vec![json!({"always_fails": true})]).expect("seed");

    let max_retries = 3;
    for _ in 0..max_retries {
        let claimed = processor.claim_records_batch(&flow, 1).expect("claim");
        assert_eq!(claimed.len(), 1, "the record is pending again after each failed attempt's reset below");
        processor.mark_record_failed(claimed[0].id, "business logic always fails").expect("mark failed");
        // Put it back within the retry budget so the next attempt can claim it again.
        if claimed[0].retry_count + 1 < max_retries {
            processor.reset_failed_records(Some(&flow), max_retries).expect("reset for next attempt");
        }
    }

    let reset_count = processor.reset_failed_records(Some(&flow), max_retries).expect("reset at cap");
    assert_eq!(reset_count, 0, "retry_count has reached max_retries; reset is a no-op");
}
