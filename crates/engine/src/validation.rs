//! Structural checks on a proposed appointment.
//!
//! [`validate`] is pure: it looks only at the candidate, the reference instant
//! and the policy. Every rule is evaluated and every violation is reported, in
//! rule order, so the caller can show all problems at once.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::{AppointmentCandidate, EngineError, Money, ResultEngine};

pub const MIN_SERVICES: usize = 1;
pub const MAX_SERVICES: usize = 5;
pub const OPENING_HOUR: u32 = 8;
pub const CLOSING_HOUR: u32 = 18;
pub const GUARD_WINDOW_MINUTES: i64 = 30;
pub const MAX_TOTAL: Money = Money::new(10_000_00);
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Business rules applied to every booking and edit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BookingPolicy {
    /// Zone in which opening hours are read.
    pub timezone: Tz,
    /// First legal local start hour (inclusive).
    pub opening_hour: u32,
    /// Local hour at which starts stop being accepted (exclusive).
    pub closing_hour: u32,
    /// Minimum separation between two starts for the same staff member.
    pub guard_window: Duration,
    pub max_total: Money,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            opening_hour: OPENING_HOUR,
            closing_hour: CLOSING_HOUR,
            guard_window: Duration::minutes(GUARD_WINDOW_MINUTES),
            max_total: MAX_TOTAL,
        }
    }
}

impl BookingPolicy {
    #[must_use]
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the `[opening, closing)` window in local hours.
    pub fn opening_hours(mut self, opening: u32, closing: u32) -> ResultEngine<Self> {
        if opening >= closing || closing > 24 {
            return Err(EngineError::OutOfRange(format!(
                "invalid opening hours {opening}..{closing}"
            )));
        }
        self.opening_hour = opening;
        self.closing_hour = closing;
        Ok(self)
    }

    pub fn guard_minutes(mut self, minutes: i64) -> ResultEngine<Self> {
        if minutes < 0 {
            return Err(EngineError::OutOfRange(
                "guard window must not be negative".to_string(),
            ));
        }
        self.guard_window = Duration::try_minutes(minutes).ok_or_else(|| {
            EngineError::OutOfRange(format!("guard window of {minutes} minutes is too large"))
        })?;
        Ok(self)
    }

    /// Checks a monetary total against `(0, max_total]`.
    pub(crate) fn total_violation(&self, total: Money) -> Option<String> {
        if !total.is_positive() {
            Some("total value must be greater than 0".to_string())
        } else if total > self.max_total {
            Some(format!("total value must not exceed {}", self.max_total))
        } else {
            None
        }
    }
}

/// Validates a candidate appointment at instant `now`.
pub fn validate(
    candidate: &AppointmentCandidate,
    now: DateTime<Utc>,
    policy: &BookingPolicy,
) -> ResultEngine<()> {
    let mut reasons = Vec::new();

    let count = candidate.service_ids.len();
    if count < MIN_SERVICES {
        reasons.push("at least one service is required".to_string());
    } else if count > MAX_SERVICES {
        reasons.push(format!("at most {MAX_SERVICES} services per appointment"));
    }

    if candidate.start_time <= now {
        reasons.push("start time must be in the future".to_string());
    }

    let local_hour = candidate.start_time.with_timezone(&policy.timezone).hour();
    if local_hour < policy.opening_hour || local_hour >= policy.closing_hour {
        reasons.push(format!(
            "start time must be between {:02}:00 and {:02}:00",
            policy.opening_hour, policy.closing_hour
        ));
    }

    if let Some(total) = candidate.total_value
        && let Some(reason) = policy.total_violation(total)
    {
        reasons.push(reason);
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(EngineError::ValidationFailed(reasons))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn utc_policy() -> BookingPolicy {
        BookingPolicy::default().timezone(chrono_tz::UTC)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap()
    }

    fn candidate_at(hour: u32, minute: u32) -> AppointmentCandidate {
        AppointmentCandidate::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            Utc.with_ymd_and_hms(2030, 1, 2, hour, minute, 0).unwrap(),
        )
    }

    fn reasons(result: ResultEngine<()>) -> Vec<String> {
        match result {
            Err(EngineError::ValidationFailed(reasons)) => reasons,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_well_formed_candidate() {
        assert!(validate(&candidate_at(8, 0), now(), &utc_policy()).is_ok());
        assert!(validate(&candidate_at(17, 59), now(), &utc_policy()).is_ok());
    }

    #[test]
    fn business_hours_are_half_open() {
        let policy = utc_policy();
        assert_eq!(
            reasons(validate(&candidate_at(18, 0), now(), &policy)),
            vec!["start time must be between 08:00 and 18:00".to_string()]
        );
        assert!(validate(&candidate_at(7, 59), now(), &policy).is_err());
    }

    #[test]
    fn hours_are_read_in_the_business_timezone() {
        // 11:00 UTC is 08:00 in São Paulo (UTC-3).
        let policy = BookingPolicy::default();
        assert!(validate(&candidate_at(11, 0), now(), &policy).is_ok());
        assert!(validate(&candidate_at(10, 59), now(), &policy).is_err());
        // 21:00 UTC is 18:00 local.
        assert!(validate(&candidate_at(21, 0), now(), &policy).is_err());
    }

    #[test]
    fn collects_every_violation() {
        let mut candidate = candidate_at(19, 0).total_value(Money::ZERO);
        candidate.service_ids.clear();
        candidate.start_time = Utc.with_ymd_and_hms(2029, 12, 31, 19, 0, 0).unwrap();

        let got = reasons(validate(&candidate, now(), &utc_policy()));
        assert_eq!(
            got,
            vec![
                "at least one service is required".to_string(),
                "start time must be in the future".to_string(),
                "start time must be between 08:00 and 18:00".to_string(),
                "total value must be greater than 0".to_string(),
            ]
        );
    }

    #[test]
    fn rejection_is_idempotent() {
        let mut candidate = candidate_at(6, 0);
        candidate.service_ids = vec![Uuid::new_v4(); 6];
        let first = reasons(validate(&candidate, now(), &utc_policy()));
        let second = reasons(validate(&candidate, now(), &utc_policy()));
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn five_services_allowed_six_rejected() {
        let mut candidate = candidate_at(10, 0);
        candidate.service_ids = vec![Uuid::new_v4(); 5];
        assert!(validate(&candidate, now(), &utc_policy()).is_ok());
        candidate.service_ids.push(Uuid::new_v4());
        assert_eq!(
            reasons(validate(&candidate, now(), &utc_policy())),
            vec!["at most 5 services per appointment".to_string()]
        );
    }

    #[test]
    fn start_equal_to_now_is_not_future() {
        let mut candidate = candidate_at(10, 0);
        candidate.start_time = now();
        assert_eq!(
            reasons(validate(&candidate, now(), &utc_policy())),
            vec!["start time must be in the future".to_string()]
        );
    }

    #[test]
    fn total_bounds_are_inclusive_at_the_top() {
        let policy = utc_policy();
        assert!(validate(&candidate_at(10, 0).total_value(MAX_TOTAL), now(), &policy).is_ok());
        assert!(
            validate(&candidate_at(10, 0).total_value(Money::new(1)), now(), &policy).is_ok()
        );
        assert_eq!(
            reasons(validate(
                &candidate_at(10, 0).total_value(MAX_TOTAL + Money::new(1)),
                now(),
                &policy
            )),
            vec!["total value must not exceed 10000.00".to_string()]
        );
    }

    #[test]
    fn policy_rejects_inverted_hours() {
        assert!(BookingPolicy::default().opening_hours(18, 8).is_err());
        assert!(BookingPolicy::default().guard_minutes(-1).is_err());
    }

    #[test]
    fn oversized_guard_window_is_out_of_range() {
        let result = BookingPolicy::default().guard_minutes(i64::MAX);
        assert!(matches!(result, Err(EngineError::OutOfRange(_))));

        let policy = BookingPolicy::default().guard_minutes(45).unwrap();
        assert_eq!(policy.guard_window, Duration::minutes(45));
    }
}
