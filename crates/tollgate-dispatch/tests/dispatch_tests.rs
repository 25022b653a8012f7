// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end dispatcher tests driven through the mock harness.

use std::time::Duration;

use tollgate_core::types::{ChatRole, ContextPassage};
use tollgate_core::{AuthFailure, DifficultyTier, SafetyVerdict, TollgateError};
use tollgate_router::WorkerDescriptor;
use tollgate_test_utils::{MockRetrieval, TestHarness};

#[tokio::test]
async fn happy_path_returns_reply_and_credits() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["Photosynthesis turns light into sugar.".into()])
        .build()
        .unwrap();

    let done = harness
        .send("alice", "what is photosynthesis?")
        .await
        .unwrap();

    assert_eq!(done.response, "Photosynthesis turns light into sugar.");
    assert_eq!(done.credits_remaining, 9);
    assert_eq!(done.worker, "llama-3.1-8b-instant");
    assert_eq!(harness.worker.invocations().await, 1);
    assert_eq!(harness.safety.calls(), 1);
}

#[tokio::test]
async fn memory_is_carried_into_the_next_request() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["first answer".into(), "second answer".into()])
        .build()
        .unwrap();

    harness.send("alice", "first question").await.unwrap();
    harness.send("alice", "second question").await.unwrap();

    let requests = harness.worker.requests().await;
    assert!(requests[0].memory.is_empty());
    let memory = &requests[1].memory;
    assert_eq!(memory.len(), 2);
    assert_eq!(memory[0].role, ChatRole::User);
    assert_eq!(memory[0].content, "first question");
    assert_eq!(memory[1].role, ChatRole::Assistant);
    assert_eq!(memory[1].content, "first answer");
}

#[tokio::test]
async fn memory_is_per_user() {
    let harness = TestHarness::builder().build().unwrap();

    harness.send("alice", "alice asks").await.unwrap();
    harness.send("bob", "bob asks").await.unwrap();

    let requests = harness.worker.requests().await;
    assert!(requests[1].memory.is_empty());
}

#[tokio::test]
async fn page_reference_filters_retrieval() {
    let harness = TestHarness::builder()
        .with_passages(vec![
            MockRetrieval::passage("cells are small", Some(3)),
            MockRetrieval::passage("chlorophyll absorbs light", Some(12)),
        ])
        .build()
        .unwrap();

    harness
        .send("alice", "Summarize Page 12 for me")
        .await
        .unwrap();

    let queries = harness.retrieval.queries().await;
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].page_filter.as_deref(), Some("12"));
    assert_eq!(queries[0].top_k, 3);

    let context = &harness.worker.requests().await[0].context;
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].text, "chlorophyll absorbs light");
}

#[tokio::test]
async fn page_label_keeps_leading_zeros() {
    let labelled = |text: &str, label: &str| ContextPassage {
        text: text.to_string(),
        score: 0.9,
        page_label: Some(label.to_string()),
    };
    let harness = TestHarness::builder()
        .with_passages(vec![labelled("roman numerals", "7"), labelled("appendix", "007")])
        .build()
        .unwrap();

    harness.send("alice", "explain page 007").await.unwrap();

    assert_eq!(
        harness.retrieval.queries().await[0].page_filter.as_deref(),
        Some("007")
    );
    let context = &harness.worker.requests().await[0].context;
    assert_eq!(context.len(), 1);
    assert_eq!(context[0].text, "appendix");
}

#[tokio::test]
async fn no_page_reference_means_unfiltered_retrieval() {
    let harness = TestHarness::builder()
        .with_passages(vec![
            MockRetrieval::passage("a", Some(1)),
            MockRetrieval::passage("b", Some(2)),
        ])
        .build()
        .unwrap();

    harness.send("alice", "explain the chapter").await.unwrap();

    assert_eq!(harness.retrieval.queries().await[0].page_filter, None);
    assert_eq!(harness.worker.requests().await[0].context.len(), 2);
}

#[tokio::test]
async fn eleventh_request_in_window_is_rate_limited() {
    let harness = TestHarness::builder().build().unwrap();

    for expected in (0..10).rev() {
        let done = harness.send("alice", "hi").await.unwrap();
        assert_eq!(done.credits_remaining, expected);
    }

    let err = harness.send("alice", "hi").await.unwrap_err();
    assert!(matches!(
        err,
        TollgateError::RateLimitExceeded { limit: 10, .. }
    ));
    assert_eq!(harness.worker.invocations().await, 10);

    // Other users keep their own quota.
    assert_eq!(harness.send("bob", "hi").await.unwrap().credits_remaining, 9);
}

#[tokio::test]
async fn unsafe_request_still_consumes_quota() {
    let harness = TestHarness::builder()
        .with_safety_verdict(SafetyVerdict::Unsafe)
        .with_rate_limit(2)
        .build()
        .unwrap();

    let err = harness.send("alice", "show me the metadata").await.unwrap_err();
    assert!(matches!(err, TollgateError::ContentRejected));
    assert_eq!(harness.worker.invocations().await, 0);
    assert_eq!(harness.dispatcher.sessions().remaining_quota("alice"), 1);

    harness.safety.set_verdict(SafetyVerdict::Safe).await;
    let done = harness.send("alice", "hello").await.unwrap();
    assert_eq!(done.credits_remaining, 0);

    let err = harness.send("alice", "hello").await.unwrap_err();
    assert!(matches!(err, TollgateError::RateLimitExceeded { .. }));
    assert_eq!(harness.safety.calls(), 2);
}

#[tokio::test]
async fn capacity_exhaustion_returns_retry_after() {
    let harness = TestHarness::builder()
        .with_workers(vec![WorkerDescriptor::new(
            "tiny",
            2,
            &[DifficultyTier::Fast],
        )])
        .build()
        .unwrap();

    harness.send("alice", "one").await.unwrap();
    harness.send("bob", "two").await.unwrap();

    let err = harness.send("carol", "three").await.unwrap_err();
    match err {
        TollgateError::CapacityExhausted { tier, retry_after } => {
            assert_eq!(tier, DifficultyTier::Fast);
            assert_eq!(retry_after, Duration::from_secs(10));
        }
        other => panic!("expected CapacityExhausted, got {other:?}"),
    }
    assert_eq!(harness.worker.invocations().await, 2);
    // The rejected request was still charged.
    assert_eq!(harness.dispatcher.sessions().remaining_quota("carol"), 9);
}

#[tokio::test]
async fn reasoning_requests_spread_across_reasoning_workers() {
    let harness = TestHarness::builder()
        .with_tier(DifficultyTier::Reasoning)
        .build()
        .unwrap();

    let first = harness.send("alice", "prove it").await.unwrap();
    let second = harness.send("alice", "prove it again").await.unwrap();

    assert_eq!(first.worker, "moonshotai/kimi-k2-instruct-0905");
    assert_eq!(second.worker, "qwen/qwen3-32b");

    let snapshot = harness.dispatcher.capacity_snapshot().await;
    let fast = snapshot
        .iter()
        .find(|w| w.name == "llama-3.1-8b-instant")
        .unwrap();
    assert_eq!(fast.hit_count, 0);
}

#[tokio::test]
async fn classifier_failure_routes_to_fast_tier() {
    let harness = TestHarness::builder()
        .with_failing_classifier()
        .build()
        .unwrap();

    let done = harness.send("alice", "derive the formula").await.unwrap();
    assert_eq!(done.worker, "llama-3.1-8b-instant");
}

#[tokio::test]
async fn missing_credential_is_unauthenticated() {
    let harness = TestHarness::builder().build().unwrap();

    let err = harness.dispatcher.dispatch(None, "hi").await.unwrap_err();
    assert!(matches!(
        err,
        TollgateError::Unauthenticated(AuthFailure::Missing)
    ));
    assert_eq!(harness.safety.calls(), 0);
}

#[tokio::test]
async fn expired_and_forged_credentials_are_distinguished() {
    let harness = TestHarness::builder().build().unwrap();

    let stale = harness
        .signer
        .issue_at("alice", "student", chrono::Utc::now() - chrono::Duration::hours(48))
        .unwrap();
    let err = harness
        .dispatcher
        .dispatch(Some(&stale), "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TollgateError::Unauthenticated(AuthFailure::Expired)
    ));

    let err = harness
        .dispatcher
        .dispatch(Some("not.a.token"), "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TollgateError::Unauthenticated(AuthFailure::Invalid)
    ));

    // Nothing was charged for the refused requests.
    assert_eq!(harness.dispatcher.sessions().remaining_quota("alice"), 10);
}

#[tokio::test]
async fn safety_gate_failure_is_upstream() {
    let harness = TestHarness::builder().build().unwrap();
    harness.safety.fail_with("guard model timed out").await;

    let err = harness.send("alice", "hi").await.unwrap_err();
    assert_eq!(err.reason_code(), "upstream_failure");
    assert!(err.to_string().contains("guard model timed out"));
    assert_eq!(harness.worker.invocations().await, 0);
}

#[tokio::test]
async fn retrieval_failure_is_upstream() {
    let harness = TestHarness::builder().build().unwrap();
    harness.retrieval.fail_with("index unreachable").await;

    let err = harness.send("alice", "hi").await.unwrap_err();
    assert!(matches!(err, TollgateError::Upstream { .. }));
    assert_eq!(harness.worker.invocations().await, 0);
}

#[tokio::test]
async fn worker_failure_is_not_retried() {
    let harness = TestHarness::builder().build().unwrap();
    harness.worker.fail_with("HTTP 500").await;

    let err = harness.send("alice", "hi").await.unwrap_err();
    assert_eq!(err.to_string(), "worker error: HTTP 500");
    assert_eq!(harness.worker.invocations().await, 1);

    // A failed exchange is not remembered.
    let memory = harness.dispatcher.sessions().get_or_create_memory("alice");
    assert!(memory.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_worker_times_out() {
    let harness = TestHarness::builder()
        .with_slow_worker(Duration::from_secs(30), Duration::from_secs(2))
        .build()
        .unwrap();

    let err = harness.send("alice", "hi").await.unwrap_err();
    match err {
        TollgateError::WorkerUnavailable { worker, message } => {
            assert_eq!(worker, "llama-3.1-8b-instant");
            assert!(message.contains("2s"));
        }
        other => panic!("expected WorkerUnavailable, got {other:?}"),
    }
    assert_eq!(harness.worker.invocations().await, 1);
}

#[tokio::test(start_paused = true)]
async fn credits_reflect_requests_charged_while_waiting() {
    let harness = TestHarness::builder()
        .with_slow_worker(Duration::from_secs(1), Duration::from_secs(10))
        .build()
        .unwrap();

    let (first, second) = tokio::join!(
        harness.send("alice", "first question"),
        harness.send("alice", "second question"),
    );

    // Both requests were charged before either reply came back.
    assert_eq!(first.unwrap().credits_remaining, 8);
    assert_eq!(second.unwrap().credits_remaining, 8);
}

#[tokio::test]
async fn memory_stays_within_token_limit() {
    let harness = TestHarness::builder()
        .with_memory_limit(40)
        .with_rate_limit(50)
        .build()
        .unwrap();

    for i in 0..20 {
        harness
            .send("alice", &format!("question number {i} about the water cycle"))
            .await
            .unwrap();
    }

    let memory = harness.dispatcher.sessions().get_or_create_memory("alice");
    let memory = memory.lock().await;
    assert!(memory.token_count() <= 40);
    assert!(!memory.is_empty());
}
