#![forbid(unsafe_code)]

//! The prelude alone is enough to drive both notifiers.

use statecraft::prelude::*;
use tokio::task::LocalSet;

#[tokio::test]
async fn prelude_drives_a_notifier_chain() {
    LocalSet::new()
        .run_until(async {
            let query = Observable::new(String::from("rust"));
            let results = AsyncStateNotifier::<usize>::new();
            results.execute(|| async { Ok::<_, String>(3) }).await;

            let summary = AsyncComputedNotifier::new(&[&query, &results as &dyn Listenable], {
                let query = query.clone();
                let results = results.clone();
                move || {
                    let line = results.with_state(|state| {
                        state.when(
                            || "searching".to_string(),
                            |n| format!("{n} hits for {}", query.get()),
                            |e| e.to_string(),
                        )
                    });
                    async move { Ok::<_, String>(line) }
                }
            });
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            assert_eq!(
                summary.state(),
                AsyncState::Data("3 hits for rust".to_string())
            );
        })
        .await;
}
