use std::path::PathBuf;
use std::sync::Arc;

use ulid::Ulid;

use crate::advisory::{AdvisoryAnnotator, AdvisoryError, FALLBACK_NOTE, NoopAnnotator};
use crate::catalog::ResourceCatalog;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::request::BookingRequest;

use super::conflict::{first_conflict, validate_span};
use super::*;

fn test_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("sarpras_test_engine");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn engine_at(path: PathBuf) -> Engine {
    Engine::new(
        Arc::new(ResourceCatalog::seed()),
        path,
        Arc::new(NotifyHub::new()),
        Arc::new(NoopAnnotator),
    )
    .unwrap()
}

fn test_engine(name: &str) -> Engine {
    engine_at(test_wal_path(name))
}

fn booking(resource_id: &str, date: &str, start: &str, end: &str) -> BookingRequest {
    BookingRequest {
        resource_id: resource_id.into(),
        requester_name: "Ananda Putra".into(),
        requester_group: "XI-A".into(),
        purpose: "Rapat OSIS".into(),
        date: date.into(),
        start_time: start.into(),
        end_time: end.into(),
    }
}

fn reservation(start: Ms, end: Ms) -> Reservation {
    Reservation {
        id: Ulid::new(),
        resource_id: "lab-kimia".into(),
        resource_kind: ResourceKind::Laboratory,
        requester_name: "Ananda Putra".into(),
        requester_group: "XI-A".into(),
        purpose: "Praktikum".into(),
        span: Span::new(start, end),
        academic_level: None,
    }
}

// ── Pure conflict detector ───────────────────────────────

#[test]
fn detector_empty_resource_is_free() {
    let rs = ResourceState::new("lab-kimia".into());
    assert!(first_conflict(&rs, &Span::new(0, 1000)).is_none());
}

#[test]
fn detector_returns_first_by_start_time() {
    let mut rs = ResourceState::new("lab-kimia".into());
    let early = reservation(100, 300);
    let late = reservation(250, 500);
    // Insert out of order; the state keeps them start-sorted
    rs.insert_reservation(late.clone());
    rs.insert_reservation(early.clone());

    let hit = first_conflict(&rs, &Span::new(200, 600)).unwrap();
    assert_eq!(hit.id, early.id);
}

#[test]
fn detector_touching_boundaries_do_not_conflict() {
    let mut rs = ResourceState::new("lab-kimia".into());
    rs.insert_reservation(reservation(100, 200));
    assert!(first_conflict(&rs, &Span::new(200, 300)).is_none());
    assert!(first_conflict(&rs, &Span::new(0, 100)).is_none());
}

#[test]
fn detector_is_pure_and_retriable() {
    let mut rs = ResourceState::new("lab-kimia".into());
    rs.insert_reservation(reservation(100, 200));
    let query = Span::new(150, 250);
    let a = first_conflict(&rs, &query).map(|r| r.id);
    let b = first_conflict(&rs, &query).map(|r| r.id);
    assert_eq!(a, b);
}

#[test]
fn span_limits_enforced() {
    assert!(validate_span(&Span::new(1000, 2000)).is_ok());
    assert!(matches!(
        validate_span(&Span::new(-5, 1000)),
        Err(ReservationError::LimitExceeded(_))
    ));
    assert!(matches!(
        validate_span(&Span::new(0, crate::limits::MAX_SPAN_DURATION_MS + 1)),
        Err(ReservationError::LimitExceeded(_))
    ));
}

// ── Submit path ──────────────────────────────────────────

#[tokio::test]
async fn submit_commits_and_lists() {
    let engine = test_engine("submit_commits.wal");
    let receipt = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();

    let listed = engine.list_by_resource("lab-kimia").await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.id);
    assert_eq!(listed[0].purpose, "Rapat OSIS");
    assert_eq!(listed[0].span.duration_ms(), 3_600_000);
}

#[tokio::test]
async fn submit_unknown_resource_fails() {
    let engine = test_engine("unknown_resource.wal");
    let result = engine
        .submit(&booking("kolam-renang", "2024-10-12", "09:00", "10:00"))
        .await;
    assert!(matches!(result, Err(ReservationError::ResourceNotFound(_))));
    assert!(engine.list_by_resource("kolam-renang").await.is_empty());
}

#[tokio::test]
async fn submit_inverted_interval_fails() {
    let engine = test_engine("inverted.wal");
    let result = engine
        .submit(&booking("lab-kimia", "2024-10-12", "11:00", "10:00"))
        .await;
    assert!(matches!(result, Err(ReservationError::Validation(_))));
}

#[tokio::test]
async fn submit_malformed_inputs_fail() {
    let engine = test_engine("malformed.wal");
    assert!(matches!(
        engine.submit(&booking("lab-kimia", "next tuesday", "09:00", "10:00")).await,
        Err(ReservationError::Validation(_))
    ));
    assert!(matches!(
        engine.submit(&booking("lab-kimia", "2024-10-12", "9 o'clock", "10:00")).await,
        Err(ReservationError::Validation(_))
    ));
}

#[tokio::test]
async fn submit_oversized_purpose_fails() {
    let engine = test_engine("long_purpose.wal");
    let mut req = booking("lab-kimia", "2024-10-12", "09:00", "10:00");
    req.purpose = "x".repeat(crate::limits::MAX_PURPOSE_LEN + 1);
    assert!(matches!(
        engine.submit(&req).await,
        Err(ReservationError::LimitExceeded(_))
    ));
}

#[tokio::test]
async fn conflict_rejected_with_winner_details() {
    let engine = test_engine("conflict_details.wal");
    let first = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();

    let result = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:30", "10:30"))
        .await;
    match result {
        Err(ReservationError::Conflict(info)) => {
            assert_eq!(info.reservation_id, first.id);
            assert_eq!(info.resource_id, "lab-kimia");
            assert_eq!(info.resource_name, "Lab Kimia");
            assert_eq!(info.requester_group, "XI-A");
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // The loser committed nothing
    assert_eq!(engine.list_by_resource("lab-kimia").await.len(), 1);
}

#[tokio::test]
async fn boundary_touch_both_succeed() {
    let engine = test_engine("boundary_touch.wal");
    engine
        .submit(&booking("lab-kimia", "2024-10-12", "10:00", "11:00"))
        .await
        .unwrap();
    engine
        .submit(&booking("lab-kimia", "2024-10-12", "11:00", "12:00"))
        .await
        .unwrap();
    assert_eq!(engine.list_by_resource("lab-kimia").await.len(), 2);
}

#[tokio::test]
async fn conflict_is_symmetric() {
    // A-then-B conflicts iff B-then-A conflicts
    let a = booking("lab-kimia", "2024-10-12", "09:00", "10:30");
    let b = booking("lab-kimia", "2024-10-12", "10:00", "11:00");

    let forward = test_engine("symmetry_fwd.wal");
    forward.submit(&a).await.unwrap();
    assert!(matches!(
        forward.submit(&b).await,
        Err(ReservationError::Conflict(_))
    ));

    let reverse = test_engine("symmetry_rev.wal");
    reverse.submit(&b).await.unwrap();
    assert!(matches!(
        reverse.submit(&a).await,
        Err(ReservationError::Conflict(_))
    ));
}

#[tokio::test]
async fn different_resources_do_not_conflict() {
    let engine = test_engine("different_resources.wal");
    engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();
    engine
        .submit(&booking("lab-fisika", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn commit_denormalizes_kind_and_level() {
    let engine = test_engine("denormalize.wal");
    engine
        .submit(&booking("room-XII-C", "2024-10-12", "14:00", "15:00"))
        .await
        .unwrap();
    engine
        .submit(&booking("eq-1", "2024-10-12", "14:00", "15:00"))
        .await
        .unwrap();

    let room = &engine.list_by_resource("room-XII-C").await[0];
    assert_eq!(room.resource_kind, ResourceKind::Classroom);
    assert_eq!(room.academic_level, Some(AcademicLevel::XII));

    let projector = &engine.list_by_resource("eq-1").await[0];
    assert_eq!(projector.resource_kind, ResourceKind::Equipment);
    assert_eq!(projector.academic_level, None);
}

#[tokio::test]
async fn commit_emits_booking_notice() {
    let engine = test_engine("notice.wal");
    let mut rx = engine.notify.subscribe("pendopo");

    engine
        .submit(&booking("pendopo", "2024-10-12", "13:00", "15:00"))
        .await
        .unwrap();

    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.title, "Booking Successful");
    assert!(notice.message.contains("Pendopo"));
    assert!(notice.message.contains("Ananda Putra"));
}

#[tokio::test]
async fn rejected_submission_emits_no_notice() {
    let engine = test_engine("no_notice.wal");
    engine
        .submit(&booking("pendopo", "2024-10-12", "13:00", "15:00"))
        .await
        .unwrap();

    let mut rx = engine.notify.subscribe("pendopo");
    let _ = engine
        .submit(&booking("pendopo", "2024-10-12", "13:30", "14:30"))
        .await;
    assert!(rx.try_recv().is_err());
}

// ── Advisory decoupling ──────────────────────────────────

struct FailingAnnotator;

#[async_trait::async_trait]
impl AdvisoryAnnotator for FailingAnnotator {
    async fn annotate(&self, _: &str, _: &str) -> Result<String, AdvisoryError> {
        Err(AdvisoryError("upstream unreachable".into()))
    }
}

struct VetoAnnotator;

#[async_trait::async_trait]
impl AdvisoryAnnotator for VetoAnnotator {
    async fn annotate(&self, _: &str, _: &str) -> Result<String, AdvisoryError> {
        Ok("CONFLICT DETECTED — do not book".into())
    }
}

#[tokio::test]
async fn advisory_failure_never_blocks_commit() {
    let engine = Engine::new(
        Arc::new(ResourceCatalog::seed()),
        test_wal_path("advisory_fail.wal"),
        Arc::new(NotifyHub::new()),
        Arc::new(FailingAnnotator),
    )
    .unwrap();

    let receipt = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();
    assert_eq!(receipt.advisory, FALLBACK_NOTE);
}

#[tokio::test]
async fn advisory_text_never_authorizes_or_vetoes() {
    // The annotator screaming "conflict" must not affect the outcome
    let engine = Engine::new(
        Arc::new(ResourceCatalog::seed()),
        test_wal_path("advisory_veto.wal"),
        Arc::new(NotifyHub::new()),
        Arc::new(VetoAnnotator),
    )
    .unwrap();

    let receipt = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();
    assert_eq!(receipt.advisory, "CONFLICT DETECTED — do not book");
    assert_eq!(engine.list_by_resource("lab-kimia").await.len(), 1);
}

// ── Concurrency ──────────────────────────────────────────

#[tokio::test]
async fn concurrent_overlapping_submissions_single_winner() {
    let engine = Arc::new(test_engine("concurrent_single.wal"));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit(&booking("rsg", "2024-10-12", "09:00", "11:00"))
                .await
        }));
    }

    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ReservationError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(engine.list_by_resource("rsg").await.len(), 1);
}

#[tokio::test]
async fn concurrent_disjoint_submissions_all_succeed() {
    let engine = Arc::new(test_engine("concurrent_disjoint.wal"));

    let mut handles = Vec::new();
    for hour in 8..14 {
        let engine = engine.clone();
        let start = format!("{hour:02}:00");
        let end = format!("{:02}:00", hour + 1);
        handles.push(tokio::spawn(async move {
            engine.submit(&booking("l-futsal", "2024-10-12", &start, &end)).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    assert_eq!(engine.list_by_resource("l-futsal").await.len(), 6);
}

#[tokio::test]
async fn random_submissions_leave_no_overlap() {
    // Property-style check: pseudo-random windows, concurrent submission,
    // then pairwise non-overlap over whatever committed.
    let engine = Arc::new(test_engine("random_no_overlap.wal"));

    let mut seed: u64 = 0x5eed_cafe;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as i64
    };

    let mut handles = Vec::new();
    for _ in 0..40 {
        // Quarter-hour grid over a school day: 07:00 + k*15min
        let slot = next().rem_euclid(40);
        let len = 1 + next().rem_euclid(8);
        let start_min = 7 * 60 + slot * 15;
        let end_min = (start_min + len * 15).min(22 * 60);
        let start = format!("{:02}:{:02}", start_min / 60, start_min % 60);
        let end = format!("{:02}:{:02}", end_min / 60, end_min % 60);
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.submit(&booking("l-utama", "2024-10-12", &start, &end)).await
        }));
    }
    for h in handles {
        let _ = h.await.unwrap(); // conflicts are expected, errors are not counted here
    }

    let committed = engine.list_by_resource("l-utama").await;
    assert!(!committed.is_empty());
    for i in 0..committed.len() {
        for j in (i + 1)..committed.len() {
            assert!(
                !committed[i].span.overlaps(&committed[j].span),
                "double booking: {:?} and {:?}",
                committed[i].span,
                committed[j].span
            );
        }
    }
}

// ── Durability ───────────────────────────────────────────

#[tokio::test]
async fn replay_restores_committed_reservations() {
    let path = test_wal_path("replay_restore.wal");
    let first_id;
    {
        let engine = engine_at(path.clone());
        first_id = engine
            .submit(&booking("lab-biologi", "2024-10-12", "09:00", "10:00"))
            .await
            .unwrap()
            .id;
        engine
            .submit(&booking("lab-biologi", "2024-10-12", "10:00", "11:00"))
            .await
            .unwrap();
    }

    let reopened = Engine::new(
        Arc::new(ResourceCatalog::seed()),
        path,
        Arc::new(NotifyHub::new()),
        Arc::new(NoopAnnotator),
    )
    .unwrap();

    let listed = reopened.list_by_resource("lab-biologi").await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first_id);

    // Replayed state still guards against overlap
    let result = reopened
        .submit(&booking("lab-biologi", "2024-10-12", "09:30", "09:45"))
        .await;
    assert!(matches!(result, Err(ReservationError::Conflict(_))));
}

// ── Listing queries ──────────────────────────────────────

#[tokio::test]
async fn list_by_date_range_intersects_and_orders() {
    let engine = test_engine("range_query.wal");
    engine.submit(&booking("lab-kimia", "2024-10-12", "10:00", "11:00")).await.unwrap();
    engine.submit(&booking("pendopo", "2024-10-12", "08:00", "09:00")).await.unwrap();
    engine.submit(&booking("l-basket", "2024-10-13", "08:00", "09:00")).await.unwrap();

    let day = crate::request::local_day_span(
        chrono::NaiveDate::from_ymd_opt(2024, 10, 12).unwrap(),
    )
    .unwrap();
    let hits = engine.list_by_date_range(day.start, day.end).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].resource_id, "pendopo");
    assert_eq!(hits[1].resource_id, "lab-kimia");
}

#[tokio::test]
async fn list_by_date_range_rejects_bad_windows() {
    let engine = test_engine("range_limits.wal");
    assert!(matches!(
        engine.list_by_date_range(1000, 1000).await,
        Err(ReservationError::Validation(_))
    ));
    assert!(matches!(
        engine
            .list_by_date_range(0, crate::limits::MAX_QUERY_WINDOW_MS + 1)
            .await,
        Err(ReservationError::LimitExceeded(_))
    ));
}

#[tokio::test]
async fn end_to_end_lab_kimia_scenario() {
    let engine = test_engine("lab_kimia_scenario.wal");

    let first = engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:00", "10:00"))
        .await
        .unwrap();

    match engine
        .submit(&booking("lab-kimia", "2024-10-12", "09:30", "10:30"))
        .await
    {
        Err(ReservationError::Conflict(info)) => assert_eq!(info.reservation_id, first.id),
        other => panic!("expected conflict with the first reservation, got {other:?}"),
    }

    engine
        .submit(&booking("lab-kimia", "2024-10-12", "10:00", "11:00"))
        .await
        .unwrap();

    assert_eq!(engine.list_by_resource("lab-kimia").await.len(), 2);
}
