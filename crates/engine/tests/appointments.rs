use chrono::Duration;

use engine::{
    AppointmentCandidate, AppointmentEdit, AppointmentFilter, AppointmentStatus, CONFLICT_REASON,
    EngineError, Money, PaymentMethod,
};
use uuid::Uuid;

mod common;
use common::{at, engine_with_db, fixture};

#[tokio::test]
async fn propose_prices_from_catalog_and_schedules() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(
            AppointmentCandidate::new(
                f.client.id,
                f.ana.id,
                vec![f.haircut.id, f.beard.id],
                at(14, 0),
            )
            .notes("  window seat  ")
            .payment_method(PaymentMethod::Pix),
        )
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.total_value, Money::new(80_00));
    assert_eq!(appointment.duration_minutes, 65);
    assert_eq!(appointment.end_time(), at(15, 5));
    assert_eq!(appointment.notes.as_deref(), Some("window seat"));

    let stored = engine.appointment(appointment.id).await.unwrap();
    assert_eq!(stored.service_ids, vec![f.haircut.id, f.beard.id]);
    assert_eq!(stored.payment_method, Some(PaymentMethod::Pix));
}

#[tokio::test]
async fn repeated_services_are_charged_once_per_occurrence() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.beard.id, f.beard.id],
            at(10, 0),
        ))
        .await
        .unwrap();
    assert_eq!(appointment.total_value, Money::new(60_00));
    assert_eq!(appointment.duration_minutes, 40);
}

#[tokio::test]
async fn guard_window_rejects_close_starts_for_same_staff() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 0),
        ))
        .await
        .unwrap();

    for (hour, minute) in [(14, 0), (14, 20), (13, 45)] {
        let err = engine
            .propose_appointment(AppointmentCandidate::new(
                f.client.id,
                f.ana.id,
                vec![f.haircut.id],
                at(hour, minute),
            ))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::ConflictDetected(CONFLICT_REASON.to_string()));
    }

    // Exactly on the boundary, or another staff member: free.
    engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 30),
        ))
        .await
        .unwrap();
    engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.bruno.id,
            vec![f.haircut.id],
            at(14, 10),
        ))
        .await
        .unwrap();

    let ana_day = engine
        .list_appointments(&AppointmentFilter {
            staff_id: Some(f.ana.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ana_day.len(), 2);
}

#[tokio::test]
async fn canceled_appointments_free_their_slot() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let first = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 0),
        ))
        .await
        .unwrap();
    engine
        .transition(first.id, AppointmentStatus::Canceled)
        .await
        .unwrap();

    let second = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 0),
        ))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn validation_collects_every_reason() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let past_and_late = chrono::Utc::now() - Duration::days(1);
    let past_and_late = past_and_late
        .date_naive()
        .and_hms_opt(20, 0, 0)
        .unwrap()
        .and_utc();
    let err = engine
        .propose_appointment(
            AppointmentCandidate::new(f.client.id, f.ana.id, vec![], past_and_late)
                .total_value(Money::ZERO),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.reasons(),
        vec![
            "at least one service is required".to_string(),
            "start time must be in the future".to_string(),
            "start time must be between 08:00 and 18:00".to_string(),
            "total value must be greater than 0".to_string(),
        ]
    );
}

#[tokio::test]
async fn references_must_exist() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let err = engine
        .propose_appointment(AppointmentCandidate::new(
            Uuid::new_v4(),
            f.ana.id,
            vec![f.haircut.id],
            at(9, 0),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReferenceNotFound(_)));

    let unknown_service = Uuid::new_v4();
    let err = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id, unknown_service],
            at(9, 0),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ReferenceNotFound(format!("service {unknown_service}"))
    );

    engine.set_staff_active(f.bruno.id, false).await.unwrap();
    let err = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.bruno.id,
            vec![f.haircut.id],
            at(9, 0),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReferenceNotFound(_)));

    // Nothing was persisted by the failed attempts.
    let all = engine
        .list_appointments(&AppointmentFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn supplied_total_must_match_catalog() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let err = engine
        .propose_appointment(
            AppointmentCandidate::new(f.client.id, f.ana.id, vec![f.haircut.id], at(9, 0))
                .total_value(Money::new(45_00)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    engine
        .propose_appointment(
            AppointmentCandidate::new(f.client.id, f.ana.id, vec![f.haircut.id], at(9, 0))
                .total_value(Money::new(50_00)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn edit_excludes_itself_from_conflicts() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 0),
        ))
        .await
        .unwrap();
    engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(15, 0),
        ))
        .await
        .unwrap();

    // Shifting by ten minutes stays inside its own old window: allowed.
    let moved = engine
        .edit_appointment(appointment.id, AppointmentEdit::new().start_time(at(14, 10)))
        .await
        .unwrap();
    assert_eq!(moved.start_time, at(14, 10));
    assert_eq!(moved.total_value, Money::new(50_00));

    // Too close to the 15:00 booking.
    let err = engine
        .edit_appointment(appointment.id, AppointmentEdit::new().start_time(at(14, 45)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConflictDetected(_)));

    // Moving to the other staff member at 15:00 is fine.
    let moved = engine
        .edit_appointment(
            appointment.id,
            AppointmentEdit::new()
                .staff_id(f.bruno.id)
                .start_time(at(15, 0)),
        )
        .await
        .unwrap();
    assert_eq!(moved.staff_id, f.bruno.id);
}

#[tokio::test]
async fn edit_after_a_staff_move_checks_the_new_agenda() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.bruno.id,
            vec![f.beard.id],
            at(16, 0),
        ))
        .await
        .unwrap();
    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(14, 0),
        ))
        .await
        .unwrap();
    engine
        .edit_appointment(appointment.id, AppointmentEdit::new().staff_id(f.bruno.id))
        .await
        .unwrap();

    // No staff id in the edit: the stored one (Bruno) is the agenda checked.
    let err = engine
        .edit_appointment(appointment.id, AppointmentEdit::new().start_time(at(15, 45)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConflictDetected(_)));

    let free_for_ana = engine
        .edit_appointment(
            appointment.id,
            AppointmentEdit::new()
                .staff_id(f.ana.id)
                .start_time(at(15, 45)),
        )
        .await
        .unwrap();
    assert_eq!(free_for_ana.staff_id, f.ana.id);
}

#[tokio::test]
async fn edit_reprices_only_when_services_change() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(11, 0),
        ))
        .await
        .unwrap();

    engine
        .update_service_price(f.haircut.id, Money::new(70_00))
        .await
        .unwrap();

    let kept = engine
        .edit_appointment(
            appointment.id,
            AppointmentEdit::new().notes(Some("bring photo".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(kept.total_value, Money::new(50_00));
    assert_eq!(kept.notes.as_deref(), Some("bring photo"));

    let repriced = engine
        .edit_appointment(
            appointment.id,
            AppointmentEdit::new().service_ids(vec![f.haircut.id, f.beard.id]),
        )
        .await
        .unwrap();
    assert_eq!(repriced.total_value, Money::new(100_00));
    assert_eq!(repriced.duration_minutes, 65);
}

#[tokio::test]
async fn lifecycle_walk_and_terminal_immutability() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(9, 0),
        ))
        .await
        .unwrap();

    let err = engine
        .transition(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition(_)));

    for target in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
    ] {
        let moved = engine.transition(appointment.id, target).await.unwrap();
        assert_eq!(moved.status, target);
    }

    for target in AppointmentStatus::ALL {
        let err = engine.transition(appointment.id, target).await.unwrap_err();
        assert!(matches!(err, EngineError::IllegalTransition(_)));
    }

    let err = engine
        .edit_appointment(appointment.id, AppointmentEdit::new().start_time(at(10, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition(_)));

    let stored = engine.appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
    assert_eq!(stored.start_time, at(9, 0));
}

#[tokio::test]
async fn list_filters_by_status_and_range() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let mut ids = Vec::new();
    for hour in [9, 10, 11] {
        let appointment = engine
            .propose_appointment(AppointmentCandidate::new(
                f.client.id,
                f.ana.id,
                vec![f.beard.id],
                at(hour, 0),
            ))
            .await
            .unwrap();
        ids.push(appointment.id);
    }
    engine
        .transition(ids[1], AppointmentStatus::NoShow)
        .await
        .unwrap();

    let scheduled = engine
        .list_appointments(&AppointmentFilter {
            statuses: Some(vec![AppointmentStatus::Scheduled]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        scheduled.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![ids[0], ids[2]]
    );

    let window = engine
        .list_appointments(&AppointmentFilter {
            from: Some(at(10, 0)),
            to: Some(at(11, 0)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id, ids[1]);

    let err = engine
        .list_appointments(&AppointmentFilter {
            from: Some(at(11, 0)),
            to: Some(at(10, 0)),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OutOfRange(_)));
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;
    let engine = std::sync::Arc::new(engine);

    let mut set = tokio::task::JoinSet::new();
    for minute in [0, 5, 10, 15] {
        let engine = engine.clone();
        let candidate =
            AppointmentCandidate::new(f.client.id, f.ana.id, vec![f.haircut.id], at(16, minute));
        set.spawn(async move { engine.propose_appointment(candidate).await });
    }

    let mut booked = 0;
    let mut conflicts = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            Ok(_) => booked += 1,
            Err(EngineError::ConflictDetected(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(booked, 1);
    assert_eq!(conflicts, 3);
}

#[tokio::test]
async fn delete_is_a_hard_delete() {
    let (engine, _db) = engine_with_db().await;
    let f = fixture(&engine).await;

    let appointment = engine
        .propose_appointment(AppointmentCandidate::new(
            f.client.id,
            f.ana.id,
            vec![f.haircut.id],
            at(9, 0),
        ))
        .await
        .unwrap();
    engine.delete_appointment(appointment.id).await.unwrap();

    assert!(matches!(
        engine.appointment(appointment.id).await,
        Err(EngineError::ReferenceNotFound(_))
    ));
    assert!(matches!(
        engine.delete_appointment(appointment.id).await,
        Err(EngineError::ReferenceNotFound(_))
    ));
}
