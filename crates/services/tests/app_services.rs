use std::sync::Arc;

use mentornet_core::Clock;
use mentornet_core::time::fixed_now;
use serde_json::json;
use services::{AppServices, CandidateMissReason, FixtureTransport, LoadPhase};
use storage::repository::Storage;

fn backend() -> Arc<FixtureTransport> {
    Arc::new(
        FixtureTransport::new()
            .with_json("/api/auth/me", 200, json!({ "studentId": 42 }))
            .with_json(
                "/api/students/42/courses",
                200,
                json!({ "courses": [{ "courseId": "c1" }, { "courseId": "c2" }] }),
            )
            .with_json("/api/courses/c1/enrollments/count", 200, json!({ "total": 31 }))
            .with_failure("/api/courses/c2/enrollments/count", "connection reset"),
    )
}

#[tokio::test]
async fn counts_follow_the_loaded_view() {
    let transport = backend();
    let services = AppServices::with_transport(
        transport.clone(),
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        None,
    );

    services.session().load().await;
    let (counts, diagnostics) = services.enrollment_counts().await;

    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].count, Ok(31));
    assert!(matches!(
        counts[1].count,
        Err(CandidateMissReason::Transport(_))
    ));
    assert_eq!(diagnostics.misses().count(), 1);
}

#[tokio::test]
async fn forget_identity_clears_cache_and_session() {
    let storage = Storage::in_memory();
    let services = AppServices::with_transport(
        backend(),
        storage.clone(),
        Clock::fixed(fixed_now()),
        None,
    );

    services.session().load().await;
    assert!(storage.identity.load_identity().await.unwrap().is_some());

    services.forget_identity().await.unwrap();

    assert!(storage.identity.load_identity().await.unwrap().is_none());
    let snapshot = services.session().snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Idle);
    assert!(snapshot.view.is_empty());
}
