#![forbid(unsafe_code)]

mod support;

use mp_core::{TransitionKind, WrapperFilter, WrapperStatus};
use mp_storage::{
    ActivateRequest, AggregateSnapshot, AggregateTarget, CompleteOutcome, CompleteRequest,
    Catalog, HistoryRequest, SkipRequest, SqliteStore, StoreError,
};
use support::{
    challenge, cid, mentor, mid, path, pid, seeded_store, task, temp_dir, user, wid, wrapper,
};

fn activate(
    store: &mut SqliteStore,
    user_id: &str,
    wrapper_id: &str,
) -> Result<WrapperStatus, StoreError> {
    store
        .activate(ActivateRequest {
            user_id: user(user_id),
            wrapper_id: wid(wrapper_id),
            expected_revision: None,
        })
        .map(|outcome| outcome.wrapper.status)
}

fn complete(
    store: &mut SqliteStore,
    user_id: &str,
    wrapper_id: &str,
) -> Result<CompleteOutcome, StoreError> {
    store.complete(CompleteRequest {
        user_id: user(user_id),
        wrapper_id: wid(wrapper_id),
        submission: Some(format!("done {wrapper_id}")),
        expected_revision: None,
    })
}

fn skip(
    store: &mut SqliteStore,
    user_id: &str,
    wrapper_id: &str,
) -> Result<WrapperStatus, StoreError> {
    store
        .skip(SkipRequest {
            user_id: user(user_id),
            wrapper_id: wid(wrapper_id),
            reason: Some("not today".to_string()),
            expected_revision: None,
        })
        .map(|outcome| outcome.wrapper.status)
}

fn status(store: &SqliteStore, user_id: &str, wrapper_id: &str) -> WrapperStatus {
    store
        .get_task_wrapper(&user(user_id), &wid(wrapper_id))
        .expect("get wrapper")
        .status
}

#[test]
fn ordered_challenge_unlocks_one_wrapper_at_a_time() {
    let (_dir, mut store) = seeded_store("ordered_challenge_unlocks_one_wrapper_at_a_time");

    assert_eq!(status(&store, "u1", "w1"), WrapperStatus::Available);
    assert_eq!(status(&store, "u1", "w2"), WrapperStatus::Locked);
    assert_eq!(status(&store, "u1", "w3"), WrapperStatus::Locked);

    assert_eq!(activate(&mut store, "u1", "w1").expect("activate w1"), WrapperStatus::Active);

    let outcome = complete(&mut store, "u1", "w1").expect("complete w1");
    assert_eq!(outcome.wrapper.status, WrapperStatus::Completed);
    assert_eq!(outcome.wrapper.submission.as_deref(), Some("done w1"));
    assert!(!outcome.challenge_completed);
    assert_eq!(status(&store, "u1", "w2"), WrapperStatus::Available);

    assert_eq!(activate(&mut store, "u1", "w2").expect("activate w2"), WrapperStatus::Active);

    let err = activate(&mut store, "u1", "w3").expect_err("w3 is locked");
    match err {
        StoreError::NotAvailable { status } => assert_eq!(status, WrapperStatus::Locked),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn second_activation_is_refused_until_the_slot_is_released() {
    let (_dir, mut store) =
        seeded_store("second_activation_is_refused_until_the_slot_is_released");

    activate(&mut store, "u1", "w1").expect("activate A");
    assert_eq!(status(&store, "u1", "b1"), WrapperStatus::Available);

    let err = activate(&mut store, "u1", "b1").expect_err("slot is taken");
    match err {
        StoreError::AlreadyActive { active_id } => assert_eq!(active_id, "w1"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(skip(&mut store, "u1", "w1").expect("skip A"), WrapperStatus::Skipped);
    assert_eq!(activate(&mut store, "u1", "b1").expect("activate B"), WrapperStatus::Active);
}

#[test]
fn activating_the_active_wrapper_again_reports_already_active() {
    let (_dir, mut store) = seeded_store("activating_the_active_wrapper_again");
    activate(&mut store, "u1", "w1").expect("activate");
    assert!(matches!(
        activate(&mut store, "u1", "w1"),
        Err(StoreError::AlreadyActive { .. })
    ));
}

#[test]
fn unknown_wrapper_is_not_found_before_any_other_check() {
    let (_dir, mut store) = seeded_store("unknown_wrapper_is_not_found");
    activate(&mut store, "u1", "w1").expect("activate");
    for result in [
        activate(&mut store, "u1", "nope").map(|_| ()),
        complete(&mut store, "u1", "nope").map(|_| ()),
        skip(&mut store, "u1", "nope").map(|_| ()),
    ] {
        match result {
            Err(StoreError::NotFound { kind, id }) => {
                assert_eq!(kind, "task_wrapper");
                assert_eq!(id, "nope");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[test]
fn completing_twice_changes_state_once() {
    let (_dir, mut store) = seeded_store("completing_twice_changes_state_once");
    activate(&mut store, "u1", "w1").expect("activate");
    let first = complete(&mut store, "u1", "w1").expect("first complete");

    let err = complete(&mut store, "u1", "w1").expect_err("second complete");
    assert!(matches!(err, StoreError::AlreadyCompleted));

    let state = store.progression_state(&user("u1")).expect("state");
    assert_eq!(state.revision, first.revision);
    assert_eq!(state.active_wrapper_id, None);

    let history = store
        .transition_history(HistoryRequest {
            user_id: user("u1"),
            wrapper_id: Some(wid("w1")),
            after_seq: None,
            limit: 50,
        })
        .expect("history");
    let kinds = history.iter().map(|event| event.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![TransitionKind::Activated, TransitionKind::Completed]);
}

#[test]
fn completing_a_wrapper_that_is_not_active_fails() {
    let (_dir, mut store) = seeded_store("completing_a_wrapper_that_is_not_active_fails");
    match complete(&mut store, "u1", "w1") {
        Err(StoreError::NotActive { active_id }) => assert_eq!(active_id, None),
        other => panic!("unexpected result: {other:?}"),
    }

    activate(&mut store, "u1", "b1").expect("activate b1");
    match skip(&mut store, "u1", "w1") {
        Err(StoreError::NotActive { active_id }) => assert_eq!(active_id.as_deref(), Some("b1")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn skip_neither_unlocks_successor_nor_completes_challenge() {
    let (_dir, mut store) = seeded_store("skip_neither_unlocks_successor");
    activate(&mut store, "u1", "w1").expect("activate");
    skip(&mut store, "u1", "w1").expect("skip");

    let challenge = store.get_challenge(&user("u1"), &cid("c:x")).expect("challenge");
    let statuses = challenge
        .wrappers
        .iter()
        .map(|view| (view.wrapper.id.as_str().to_string(), view.status))
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![
            ("w1".to_string(), WrapperStatus::Available),
            ("w2".to_string(), WrapperStatus::Locked),
            ("w3".to_string(), WrapperStatus::Locked),
        ]
    );
    assert!(!challenge.progress.is_completed);
    assert_eq!(challenge.progress.completed_tasks, 0);

    let skipped = &challenge.wrappers[0];
    assert!(skipped.skipped());
    assert_eq!(skipped.skip_count, 1);
    assert_eq!(skipped.skip_reason.as_deref(), Some("not today"));

    // A skipped wrapper can be picked up again and finished.
    activate(&mut store, "u1", "w1").expect("re-activate");
    complete(&mut store, "u1", "w1").expect("complete");
    let view = store.get_task_wrapper(&user("u1"), &wid("w1")).expect("view");
    assert_eq!(view.status, WrapperStatus::Completed);
    assert!(!view.skipped());
}

#[test]
fn completing_a_challenge_cascades_into_path_progress() {
    let (_dir, mut store) = seeded_store("completing_a_challenge_cascades");
    let u1 = user("u1");

    for id in ["w1", "w2"] {
        activate(&mut store, "u1", id).expect("activate");
        let outcome = complete(&mut store, "u1", id).expect("complete");
        assert!(!outcome.challenge_completed);
    }
    activate(&mut store, "u1", "w3").expect("activate w3");
    let outcome = complete(&mut store, "u1", "w3").expect("complete w3");
    assert!(outcome.challenge_completed);
    assert!(outcome.challenge.progress.is_completed);
    assert!(!outcome.challenge.progress.is_active);
    assert_eq!(outcome.challenge.progress.completed_tasks, 3);
    assert_eq!(outcome.challenge.progress.total_tasks, 3);

    let path = outcome.path.expect("challenge belongs to a path");
    assert_eq!(path.progress.completed_challenges, 1);
    assert_eq!(path.progress.total_challenges, 2);
    assert_eq!(path.progress.percent(), 50);

    let state = store.progression_state(&u1).expect("state");
    let stored = state
        .paths
        .iter()
        .find(|entry| entry.path_id == pid("p:main"))
        .expect("stored path progress");
    assert_eq!(stored.progress, path.progress);

    let view = store.get_path(&u1, &pid("p:main")).expect("path view");
    assert_eq!(view.challenges.len(), 2);
    assert!(view.challenges[0].progress.is_completed);
    assert!(view.challenges[1].progress.is_active);
}

#[test]
fn empty_path_reports_zero_progress() {
    let (_dir, mut store) = seeded_store("empty_path_reports_zero_progress");
    let view = store.get_path(&user("u1"), &pid("p:empty")).expect("path");
    assert_eq!(view.progress.total_challenges, 0);
    assert_eq!(view.progress.percent(), 0);
    assert_eq!(view.progress.ratio_percent(), 0.0);
    assert!(!view.progress.is_completed());

    let snapshot = store
        .recompute_aggregates(&user("u1"), &AggregateTarget::Path(pid("p:empty")))
        .expect("recompute");
    match snapshot {
        AggregateSnapshot::Path { progress, challenges } => {
            assert_eq!(progress.percent(), 0);
            assert!(challenges.is_empty());
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }
}

#[test]
fn gated_path_locks_later_challenges_until_earlier_ones_complete() {
    let (_dir, mut store) = seeded_store("gated_path_locks_later_challenges");
    assert_eq!(status(&store, "u1", "g1a"), WrapperStatus::Available);
    assert_eq!(status(&store, "u1", "g2a"), WrapperStatus::Locked);
    assert!(store.get_challenge(&user("u1"), &cid("c:g2")).expect("g2").gated);

    assert!(matches!(
        activate(&mut store, "u1", "g2a"),
        Err(StoreError::NotAvailable {
            status: WrapperStatus::Locked
        })
    ));

    activate(&mut store, "u1", "g1a").expect("activate g1a");
    let outcome = complete(&mut store, "u1", "g1a").expect("complete g1a");
    assert!(outcome.challenge_completed);
    assert_eq!(status(&store, "u1", "g2a"), WrapperStatus::Available);

    // The open path never gates: c:y is workable while c:x is untouched.
    assert_eq!(status(&store, "u1", "b1"), WrapperStatus::Available);
}

#[test]
fn progress_is_tracked_per_user() {
    let (_dir, mut store) = seeded_store("progress_is_tracked_per_user");
    activate(&mut store, "u1", "w1").expect("u1 activates");
    activate(&mut store, "u2", "b1").expect("u2 has its own slot");
    complete(&mut store, "u1", "w1").expect("u1 completes");

    assert_eq!(status(&store, "u1", "w2"), WrapperStatus::Available);
    assert_eq!(status(&store, "u2", "w2"), WrapperStatus::Locked);
    assert_eq!(status(&store, "u2", "b1"), WrapperStatus::Active);
}

#[test]
fn stale_expected_revision_is_a_conflict_without_side_effects() {
    let (_dir, mut store) = seeded_store("stale_expected_revision_is_a_conflict");
    let u1 = user("u1");
    let before = store.progression_state(&u1).expect("state");
    assert_eq!(before.revision, 0);

    let err = store
        .activate(ActivateRequest {
            user_id: u1.clone(),
            wrapper_id: wid("w1"),
            expected_revision: Some(7),
        })
        .expect_err("stale revision");
    match err {
        StoreError::ConcurrentConflict { expected, actual } => {
            assert_eq!(expected, 7);
            assert_eq!(actual, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.progression_state(&u1).expect("state").active_wrapper_id, None);

    store
        .activate(ActivateRequest {
            user_id: u1.clone(),
            wrapper_id: wid("w1"),
            expected_revision: Some(0),
        })
        .expect("matching revision");
    assert_eq!(store.progression_state(&u1).expect("state").revision, 1);
}

#[test]
fn failed_transitions_leave_no_trace() {
    let (_dir, mut store) = seeded_store("failed_transitions_leave_no_trace");
    let u1 = user("u1");
    activate(&mut store, "u1", "w1").expect("activate");
    let before = store.progression_state(&u1).expect("state");

    let _ = activate(&mut store, "u1", "b1").expect_err("slot is taken");
    let _ = complete(&mut store, "u1", "b1").expect_err("b1 not active");
    let _ = skip(&mut store, "u1", "w2").expect_err("w2 not active");

    let after = store.progression_state(&u1).expect("state");
    assert_eq!(after, before);
    let history = store
        .transition_history(HistoryRequest {
            user_id: u1,
            wrapper_id: None,
            after_seq: None,
            limit: 100,
        })
        .expect("history");
    assert_eq!(history.len(), 1);
}

#[test]
fn history_records_transitions_in_order_with_details() {
    let (_dir, mut store) = seeded_store("history_records_transitions_in_order");
    activate(&mut store, "u1", "w1").expect("activate w1");
    skip(&mut store, "u1", "w1").expect("skip w1");
    activate(&mut store, "u1", "w1").expect("activate w1 again");
    complete(&mut store, "u1", "w1").expect("complete w1");

    let history = store
        .transition_history(HistoryRequest {
            user_id: user("u1"),
            wrapper_id: None,
            after_seq: None,
            limit: 10,
        })
        .expect("history");
    let kinds = history.iter().map(|event| event.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            TransitionKind::Activated,
            TransitionKind::Skipped,
            TransitionKind::Activated,
            TransitionKind::Completed,
        ]
    );
    assert!(history.windows(2).all(|pair| pair[0].seq < pair[1].seq));
    let revisions = history.iter().map(|event| event.revision).collect::<Vec<_>>();
    assert_eq!(revisions, vec![1, 2, 3, 4]);
    assert_eq!(
        history[1].detail,
        Some(serde_json::json!({ "reason": "not today" }))
    );
    assert_eq!(
        history[3].detail,
        Some(serde_json::json!({ "submission": "done w1" }))
    );

    let limited = store
        .transition_history(HistoryRequest {
            user_id: user("u1"),
            wrapper_id: None,
            after_seq: None,
            limit: 2,
        })
        .expect("history");
    assert_eq!(limited.len(), 2);
}

#[test]
fn mission_request_is_gated_by_the_active_slot() {
    let (_dir, mut store) = seeded_store("mission_request_is_gated");
    let u1 = user("u1");

    let open = store.mission_request(&u1, None).expect("gate open");
    let ids = open
        .iter()
        .map(|view| view.wrapper.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["g1a", "w1", "b1", "z1"]);
    assert!(open.iter().all(|view| view.status == WrapperStatus::Available));
    assert!(!ids.contains(&"g2a"));

    let coach = store
        .mission_request(&u1, Some(&mid("m:coach")))
        .expect("coach missions");
    let coach_ids = coach
        .iter()
        .map(|view| view.wrapper.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(coach_ids, vec!["b1", "z1"]);

    assert!(matches!(
        store.mission_request(&u1, Some(&mid("m:nobody"))),
        Err(StoreError::NotFound { kind: "mentor", .. })
    ));

    activate(&mut store, "u1", "w1").expect("activate");
    match store.mission_request(&u1, None) {
        Err(StoreError::AlreadyActive { active_id }) => assert_eq!(active_id, "w1"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn list_filters_by_derived_status() {
    let (_dir, mut store) = seeded_store("list_filters_by_derived_status");
    let u1 = user("u1");
    activate(&mut store, "u1", "w1").expect("activate");
    complete(&mut store, "u1", "w1").expect("complete");
    activate(&mut store, "u1", "w2").expect("activate w2");

    let all = store.list_task_wrappers(&u1, WrapperFilter::All).expect("all");
    assert_eq!(all.len(), 8);
    let order = all
        .iter()
        .map(|view| view.wrapper.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["g1a", "g2a", "w1", "w2", "w3", "b1", "b2", "z1"]);

    let completed = store
        .list_task_wrappers(&u1, WrapperFilter::Completed)
        .expect("completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].wrapper.id.as_str(), "w1");

    let active = store.list_task_wrappers(&u1, WrapperFilter::Active).expect("active");
    let ids = active
        .iter()
        .map(|view| (view.wrapper.id.as_str(), view.status))
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            ("g1a", WrapperStatus::Available),
            ("w2", WrapperStatus::Active),
            ("b1", WrapperStatus::Available),
            ("z1", WrapperStatus::Available),
        ]
    );
}

#[test]
fn recompute_is_idempotent_and_never_touches_marks() {
    let (_dir, mut store) = seeded_store("recompute_is_idempotent");
    let u1 = user("u1");
    activate(&mut store, "u1", "w1").expect("activate");
    complete(&mut store, "u1", "w1").expect("complete");
    let before = store.progression_state(&u1).expect("state");

    let target = AggregateTarget::Challenge(cid("c:x"));
    let first = store.recompute_aggregates(&u1, &target).expect("first");
    let second = store.recompute_aggregates(&u1, &target).expect("second");
    assert_eq!(first, second);
    match first {
        AggregateSnapshot::Challenge(progress) => {
            assert_eq!(progress.completed_tasks, 1);
            assert_eq!(progress.total_tasks, 3);
            assert!(progress.is_active);
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }

    let path = store
        .recompute_aggregates(&u1, &AggregateTarget::Path(pid("p:main")))
        .expect("path");
    assert!(matches!(path, AggregateSnapshot::Path { .. }));

    let after = store.progression_state(&u1).expect("state");
    assert_eq!(after.revision, before.revision);
    assert_eq!(after.active_wrapper_id, before.active_wrapper_id);
    assert_eq!(status(&store, "u1", "w1"), WrapperStatus::Completed);

    assert!(matches!(
        store.recompute_aggregates(&u1, &AggregateTarget::Challenge(cid("c:missing"))),
        Err(StoreError::NotFound { kind: "challenge", .. })
    ));
}

#[test]
fn state_survives_reopening_the_store() {
    let (dir, mut store) = seeded_store("state_survives_reopening_the_store");
    activate(&mut store, "u1", "w1").expect("activate");
    drop(store);

    let reopened = SqliteStore::open(&dir).expect("reopen");
    let state = reopened.progression_state(&user("u1")).expect("state");
    assert_eq!(state.active_wrapper_id.as_ref().map(|id| id.as_str()), Some("w1"));
    assert_eq!(state.revision, 1);
}

#[test]
fn retried_completion_with_its_original_revision_reports_already_completed() {
    let (_dir, mut store) = seeded_store("retried_completion_reports_already_completed");
    let u1 = user("u1");
    let activated = store
        .activate(ActivateRequest {
            user_id: u1.clone(),
            wrapper_id: wid("w1"),
            expected_revision: Some(0),
        })
        .expect("activate");
    assert_eq!(activated.revision, 1);

    let request = CompleteRequest {
        user_id: u1.clone(),
        wrapper_id: wid("w1"),
        submission: Some("notes".to_string()),
        expected_revision: Some(activated.revision),
    };
    let first = store.complete(request.clone()).expect("first complete");
    assert_eq!(first.revision, 2);

    // Same request again, as after a lost response.
    let err = store.complete(request).expect_err("retried complete");
    assert!(matches!(err, StoreError::AlreadyCompleted), "got {err:?}");
    assert_eq!(store.progression_state(&u1).expect("state").revision, 2);
}

#[test]
fn live_completion_with_a_stale_revision_still_conflicts() {
    let (_dir, mut store) = seeded_store("live_completion_with_a_stale_revision");
    activate(&mut store, "u1", "w1").expect("activate");
    let err = store
        .complete(CompleteRequest {
            user_id: user("u1"),
            wrapper_id: wid("w1"),
            submission: None,
            expected_revision: Some(0),
        })
        .expect_err("stale revision");
    assert!(matches!(
        err,
        StoreError::ConcurrentConflict {
            expected: 0,
            actual: 1
        }
    ));
}

#[test]
fn transitions_report_the_revision_they_wrote() {
    let (dir, mut first) = seeded_store("transitions_report_the_revision_they_wrote");
    let mut second = SqliteStore::open(&dir).expect("second connection");
    let u1 = user("u1");

    let activated = first
        .activate(ActivateRequest {
            user_id: u1.clone(),
            wrapper_id: wid("w1"),
            expected_revision: None,
        })
        .expect("activate on first");
    let skipped = second
        .skip(SkipRequest {
            user_id: u1.clone(),
            wrapper_id: wid("w1"),
            reason: None,
            expected_revision: None,
        })
        .expect("skip on second");
    assert_eq!(activated.revision, 1);
    assert_eq!(skipped.revision, 2);

    // The first writer's revision is now stale and must not pass the check.
    let err = first
        .activate(ActivateRequest {
            user_id: u1,
            wrapper_id: wid("w1"),
            expected_revision: Some(activated.revision),
        })
        .expect_err("stale revision");
    assert!(matches!(
        err,
        StoreError::ConcurrentConflict {
            expected: 1,
            actual: 2
        }
    ));
}

#[test]
fn history_pages_forward_with_after_seq() {
    let (_dir, mut store) = seeded_store("history_pages_forward_with_after_seq");
    for _ in 0..3 {
        activate(&mut store, "u1", "w1").expect("activate");
        skip(&mut store, "u1", "w1").expect("skip");
    }
    let page = |store: &SqliteStore, after_seq| {
        store
            .transition_history(HistoryRequest {
                user_id: user("u1"),
                wrapper_id: None,
                after_seq,
                limit: 4,
            })
            .expect("history")
    };

    let first = page(&store, None);
    assert_eq!(first.len(), 4);
    let second = page(&store, first.last().map(|event| event.seq));
    assert_eq!(second.len(), 2);
    assert!(second[0].seq > first[3].seq);
    let revisions = first
        .iter()
        .chain(second.iter())
        .map(|event| event.revision)
        .collect::<Vec<_>>();
    assert_eq!(revisions, vec![1, 2, 3, 4, 5, 6]);
    assert!(page(&store, second.last().map(|event| event.seq)).is_empty());
}

#[test]
fn listed_wrappers_carry_their_stored_marks() {
    let (_dir, mut store) = seeded_store("listed_wrappers_carry_their_stored_marks");
    activate(&mut store, "u1", "w1").expect("activate");
    skip(&mut store, "u1", "w1").expect("skip");
    activate(&mut store, "u1", "w1").expect("activate again");
    skip(&mut store, "u1", "w1").expect("skip again");
    activate(&mut store, "u1", "b1").expect("activate b1");
    complete(&mut store, "u1", "b1").expect("complete b1");

    let views = store
        .list_task_wrappers(&user("u1"), WrapperFilter::All)
        .expect("list");
    let w1 = views
        .iter()
        .find(|view| view.wrapper.id.as_str() == "w1")
        .expect("w1");
    assert_eq!(w1.status, WrapperStatus::Available);
    assert_eq!(w1.skip_count, 2);
    assert_eq!(w1.skip_reason.as_deref(), Some("not today"));
    assert!(w1.skipped());
    let b1 = views
        .iter()
        .find(|view| view.wrapper.id.as_str() == "b1")
        .expect("b1");
    assert_eq!(b1.status, WrapperStatus::Completed);
    assert_eq!(b1.submission.as_deref(), Some("done b1"));
    assert!(views
        .iter()
        .filter(|view| !["w1", "b1"].contains(&view.wrapper.id.as_str()))
        .all(|view| view.skip_count == 0 && view.updated_at_ms.is_none()));
}

#[test]
fn wrappers_are_listed_in_authored_path_order() {
    let dir = temp_dir("wrappers_are_listed_in_authored_path_order");
    let mut store = SqliteStore::open(&dir).expect("open store");
    store
        .apply_catalog(&Catalog {
            tasks: vec![task("t:one")],
            mentors: vec![mentor("m:guide")],
            challenges: vec![
                challenge("c:alpha", "m:guide", vec![wrapper("a1", "t:one", 1)]),
                challenge("c:beta", "m:guide", vec![wrapper("b1", "t:one", 1)]),
                challenge("c:loose", "m:guide", vec![wrapper("l1", "t:one", 1)]),
                challenge("c:aside", "m:guide", vec![wrapper("s1", "t:one", 1)]),
            ],
            // Beta is authored before alpha.
            paths: vec![path("p:route", false, &["c:beta", "c:alpha"])],
        })
        .expect("apply catalog");

    let ids = store
        .list_task_wrappers(&user("u1"), WrapperFilter::All)
        .expect("list")
        .into_iter()
        .map(|view| view.wrapper.id.into_string())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["b1", "a1", "s1", "l1"]);
    let _ = std::fs::remove_dir_all(&dir);
}
