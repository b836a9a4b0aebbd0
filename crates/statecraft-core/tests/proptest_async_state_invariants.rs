#![forbid(unsafe_code)]

//! Property-based invariant tests for `AsyncState` and `RetryPolicy`.
//!
//! 1. Exactly one of `is_loading / has_data / has_error` holds.
//! 2. `when` dispatches to the branch matching the variant.
//! 3. `maybe_when` agrees with `when` when every handler is registered.
//! 4. Back-off delays never exceed the cap and never decrease.
//! 5. Loading progress always lands in `[0, 1]`.

use std::time::Duration;

use proptest::prelude::*;
use statecraft_core::{AsyncState, RetryPolicy};

// ── Helpers ─────────────────────────────────────────────────────────────

fn any_state() -> impl Strategy<Value = AsyncState<i64>> {
    prop_oneof![
        Just(AsyncState::<i64>::loading()),
        (0.0f64..=1.0).prop_map(AsyncState::<i64>::loading_with_progress),
        any::<i64>().prop_map(AsyncState::Data),
        "[a-z ]{0,16}".prop_map(|message: String| AsyncState::<i64>::error(message)),
    ]
}

#[derive(Debug, PartialEq)]
enum Branch {
    Loading,
    Data(i64),
    Error(String),
}

fn any_policy() -> impl Strategy<Value = RetryPolicy> {
    (0u32..12, 1u64..500, 0u64..10_000).prop_map(|(retries, base, extra)| {
        RetryPolicy::new(
            retries,
            Duration::from_millis(base),
            Duration::from_millis(base + extra),
        )
        .expect("base > 0 and cap >= base")
    })
}

proptest! {
    // ═════════════════════════════════════════════════════════════════
    // 1. Exactly one variant test holds
    // ═════════════════════════════════════════════════════════════════
    #[test]
    fn exactly_one_variant_test(state in any_state()) {
        let flags = [state.is_loading(), state.has_data(), state.has_error()];
        prop_assert_eq!(flags.iter().filter(|f| **f).count(), 1);
    }

    // ═════════════════════════════════════════════════════════════════
    // 2. when() picks the matching branch
    // ═════════════════════════════════════════════════════════════════
    #[test]
    fn when_matches_variant(state in any_state()) {
        let branch = state.when(
            || Branch::Loading,
            |v| Branch::Data(*v),
            |e| Branch::Error(e.to_string()),
        );
        match &state {
            AsyncState::Loading { .. } => prop_assert_eq!(branch, Branch::Loading),
            AsyncState::Data(v) => prop_assert_eq!(branch, Branch::Data(*v)),
            AsyncState::Error(e) => prop_assert_eq!(branch, Branch::Error(e.clone())),
        }
    }

    // ═════════════════════════════════════════════════════════════════
    // 3. maybe_when with all handlers == when
    // ═════════════════════════════════════════════════════════════════
    #[test]
    fn maybe_when_full_agrees_with_when(state in any_state()) {
        let full = state
            .maybe_when()
            .loading(|_| Branch::Loading)
            .data(|v| Branch::Data(*v))
            .error(|e| Branch::Error(e.to_string()))
            .or_else(|| unreachable!("every variant is handled"));
        let exhaustive = state.when(
            || Branch::Loading,
            |v| Branch::Data(*v),
            |e| Branch::Error(e.to_string()),
        );
        prop_assert_eq!(full, exhaustive);
    }

    // ═════════════════════════════════════════════════════════════════
    // 4. Back-off is capped and monotone
    // ═════════════════════════════════════════════════════════════════
    #[test]
    fn backoff_capped_and_monotone(policy in any_policy()) {
        let mut previous = Duration::ZERO;
        for attempt in 0..40 {
            let delay = policy.delay_for(attempt);
            prop_assert!(delay <= policy.max_delay());
            prop_assert!(delay >= policy.base_delay());
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn attempts_are_retries_plus_one(policy in any_policy()) {
        let tries = (0..policy.max_attempts())
            .take_while(|a| *a == 0 || policy.should_retry(a - 1))
            .count();
        prop_assert_eq!(tries as u32, policy.max_retries() + 1);
    }

    // ═════════════════════════════════════════════════════════════════
    // 5. Progress clamped
    // ═════════════════════════════════════════════════════════════════
    #[test]
    fn progress_always_in_unit_range(p in -10.0f64..10.0) {
        let state: AsyncState<()> = AsyncState::loading_with_progress(p);
        let progress = state.progress().expect("finite progress is kept");
        prop_assert!((0.0..=1.0).contains(&progress));
    }
}

#[cfg(feature = "serde")]
#[test]
fn retry_policy_deserialization_validates() {
    let ok = RetryPolicy::default();
    let json = serde_json::to_string(&ok).unwrap();
    let back: RetryPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ok);

    let bad = r#"{"max_retries":1,"base_delay":{"secs":0,"nanos":0},"max_delay":{"secs":1,"nanos":0}}"#;
    assert!(serde_json::from_str::<RetryPolicy>(bad).is_err());
}
