use std::sync::Arc;

use chrono::{Duration, Utc};

use super::RecordStore;
use crate::model::SubmissionStatus;
use crate::test_utils::{create_test_submission, create_test_submission_at};

#[test]
fn snapshot_is_stable_while_the_store_moves_on() {
    let store = RecordStore::with_records(vec![create_test_submission("sub-1", "stu-1")]);
    let before = store.snapshot();

    store.replace(vec![
        create_test_submission("sub-2", "stu-2"),
        create_test_submission("sub-3", "stu-3"),
    ]);

    assert_eq!(before.len(), 1);
    assert_eq!(before[0].id, "sub-1");
    assert_eq!(store.snapshot().len(), 2);
}

#[test]
fn apply_transforms_only_the_matching_record() {
    let store = RecordStore::with_records(vec![
        create_test_submission("sub-1", "stu-1"),
        create_test_submission("sub-2", "stu-2"),
    ]);

    let applied = store.apply("sub-2", |s| {
        let mut next = s.clone();
        next.status = SubmissionStatus::Approved;
        next.teacher_approved = true;
        next
    });

    assert!(applied.changed);
    assert_eq!(applied.snapshot[0].status, SubmissionStatus::Analyzed);
    assert_eq!(applied.snapshot[1].status, SubmissionStatus::Approved);
    assert!(applied.snapshot[1].teacher_approved);
}

#[test]
fn apply_with_unknown_id_returns_the_same_snapshot() {
    let store = RecordStore::with_records(vec![create_test_submission("sub-1", "stu-1")]);
    let before = store.snapshot();

    let applied = store.apply("sub-missing", |s| s.clone());

    assert!(!applied.changed);
    assert!(Arc::ptr_eq(&before, &applied.snapshot));
}

#[test]
fn apply_preserves_collection_order() {
    let store = RecordStore::with_records(vec![
        create_test_submission("sub-1", "stu-1"),
        create_test_submission("sub-2", "stu-2"),
        create_test_submission("sub-3", "stu-3"),
    ]);

    store.apply("sub-2", |s| {
        let mut next = s.clone();
        next.ai_score = Some(99);
        next
    });

    let ids: Vec<_> = store.snapshot().iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids, ["sub-1", "sub-2", "sub-3"]);
}

#[test]
fn prepend_puts_the_new_record_first_even_when_older() {
    let now = Utc::now();
    let store = RecordStore::with_records(vec![create_test_submission_at(
        "sub-newest",
        "stu-1",
        now,
    )]);

    let older = create_test_submission_at("sub-older", "stu-2", now - Duration::days(3));
    let snapshot = store.prepend(older);

    assert_eq!(snapshot[0].id, "sub-older");
    assert_eq!(snapshot[1].id, "sub-newest");
    assert!(snapshot[0].created_at < snapshot[1].created_at);
}

#[test]
fn snapshots_stay_whole_under_concurrent_writes() {
    let store = Arc::new(RecordStore::with_records(vec![create_test_submission(
        "sub-1", "stu-1",
    )]));

    let writer = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for score in 0..200 {
                store.apply("sub-1", |s| {
                    let mut next = s.clone();
                    next.ai_score = Some(score % 100);
                    next.touch();
                    next
                });
            }
        })
    };

    for _ in 0..200 {
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "sub-1");
    }

    writer.join().unwrap();
}
