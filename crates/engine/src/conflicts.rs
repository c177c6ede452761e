//! Staff double-booking detection.
//!
//! Two appointments for the same staff member collide when their start times
//! are less than the guard window apart, in either direction. Service
//! durations are not considered. Canceled appointments never block a slot.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{Appointment, AppointmentStatus};

pub const CONFLICT_REASON: &str = "time slot unavailable for this staff member";

/// The slot a candidate wants to occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub staff_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Set when editing, so an appointment never collides with itself.
    pub exclude: Option<Uuid>,
}

/// `true` when `a` and `b` are closer than `guard`. Symmetric.
#[must_use]
pub fn within_guard(a: DateTime<Utc>, b: DateTime<Utc>, guard: Duration) -> bool {
    (a - b).abs() < guard
}

/// Returns the first existing appointment that blocks `slot`.
pub fn find_conflict<'a>(
    slot: &Slot,
    existing: &'a [Appointment],
    guard: Duration,
) -> Option<&'a Appointment> {
    existing.iter().find(|other| {
        other.staff_id == slot.staff_id
            && other.status != AppointmentStatus::Canceled
            && Some(other.id) != slot.exclude
            && within_guard(slot.start_time, other.start_time, guard)
    })
}

#[must_use]
pub fn has_conflict(slot: &Slot, existing: &[Appointment], guard: Duration) -> bool {
    find_conflict(slot, existing, guard).is_some()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::Money;

    const GUARD: i64 = 30;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 4, hour, minute, 0).unwrap()
    }

    fn booked(staff_id: Uuid, start: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            staff_id,
            service_ids: vec![Uuid::new_v4()],
            start_time: start,
            status,
            total_value: Money::new(2_500),
            duration_minutes: 90,
            notes: None,
            payment_method: None,
            created_at: start,
            updated_at: start,
        }
    }

    fn slot(staff_id: Uuid, start: DateTime<Utc>) -> Slot {
        Slot {
            staff_id,
            start_time: start,
            exclude: None,
        }
    }

    #[test]
    fn guard_window_scenario() {
        let staff = Uuid::new_v4();
        let existing = vec![booked(staff, at(14, 0), AppointmentStatus::Scheduled)];
        let guard = Duration::minutes(GUARD);

        assert!(has_conflict(&slot(staff, at(14, 20)), &existing, guard));
        assert!(!has_conflict(&slot(staff, at(14, 35)), &existing, guard));
        assert!(has_conflict(&slot(staff, at(13, 35)), &existing, guard));
    }

    #[test]
    fn exactly_one_window_apart_is_free() {
        let staff = Uuid::new_v4();
        let existing = vec![booked(staff, at(14, 0), AppointmentStatus::Confirmed)];
        let guard = Duration::minutes(GUARD);

        assert!(!has_conflict(&slot(staff, at(14, 30)), &existing, guard));
        assert!(!has_conflict(&slot(staff, at(13, 30)), &existing, guard));
        assert!(has_conflict(&slot(staff, at(14, 0)), &existing, guard));
    }

    #[test]
    fn conflict_is_symmetric() {
        let staff = Uuid::new_v4();
        let guard = Duration::minutes(GUARD);
        for (a, b) in [(at(9, 0), at(9, 10)), (at(9, 0), at(9, 45)), (at(12, 5), at(11, 40))] {
            let left = booked(staff, a, AppointmentStatus::Scheduled);
            let right = booked(staff, b, AppointmentStatus::Scheduled);
            assert_eq!(
                has_conflict(&slot(staff, a), std::slice::from_ref(&right), guard),
                has_conflict(&slot(staff, b), std::slice::from_ref(&left), guard),
            );
        }
    }

    #[test]
    fn canceled_appointments_never_block() {
        let staff = Uuid::new_v4();
        let existing = vec![booked(staff, at(10, 0), AppointmentStatus::Canceled)];
        let guard = Duration::minutes(GUARD);

        for minute in [0, 5, 15, 29] {
            assert!(!has_conflict(&slot(staff, at(10, minute)), &existing, guard));
        }
    }

    #[test]
    fn completed_and_no_show_still_block() {
        let staff = Uuid::new_v4();
        let guard = Duration::minutes(GUARD);
        for status in [AppointmentStatus::Completed, AppointmentStatus::NoShow] {
            let existing = vec![booked(staff, at(10, 0), status)];
            assert!(has_conflict(&slot(staff, at(10, 10)), &existing, guard));
        }
    }

    #[test]
    fn other_staff_do_not_collide() {
        let existing = vec![booked(Uuid::new_v4(), at(10, 0), AppointmentStatus::Scheduled)];
        assert!(!has_conflict(
            &slot(Uuid::new_v4(), at(10, 0)),
            &existing,
            Duration::minutes(GUARD)
        ));
    }

    #[test]
    fn edited_appointment_is_excluded_from_its_own_set() {
        let staff = Uuid::new_v4();
        let own = booked(staff, at(15, 0), AppointmentStatus::Scheduled);
        let guard = Duration::minutes(GUARD);
        let moved = Slot {
            staff_id: staff,
            start_time: at(15, 10),
            exclude: Some(own.id),
        };
        assert!(!has_conflict(&moved, std::slice::from_ref(&own), guard));
        assert!(has_conflict(&slot(staff, at(15, 10)), &[own], guard));
    }
}
