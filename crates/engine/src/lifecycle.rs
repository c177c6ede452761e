//! Appointment lifecycle.
//!
//! ```text
//! scheduled ──► confirmed ──┐
//!     │             │       ├──► in_progress ──► completed
//!     └─────────────┼───────┘         │
//!                   ├──► no_show      │
//!                   └──► canceled ◄───┘
//! ```
//!
//! `completed`, `canceled` and `no_show` are terminal: every transition out of
//! them fails with [`EngineError::IllegalTransition`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        Self::Scheduled,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Canceled,
        Self::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::NoShow => "no_show",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::NoShow)
    }

    /// States reachable from `self` in one step.
    #[must_use]
    pub fn next_states(self) -> &'static [AppointmentStatus] {
        match self {
            Self::Scheduled => &[
                Self::Confirmed,
                Self::InProgress,
                Self::Canceled,
                Self::NoShow,
            ],
            // Same outgoing rights as `scheduled`, minus re-confirming.
            Self::Confirmed => &[Self::InProgress, Self::Canceled, Self::NoShow],
            Self::InProgress => &[Self::Completed, Self::Canceled],
            Self::Completed | Self::Canceled | Self::NoShow => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, target: AppointmentStatus) -> bool {
        self.next_states().contains(&target)
    }

    /// Validates `self -> target` and returns the new state.
    pub fn transition(self, target: AppointmentStatus) -> ResultEngine<AppointmentStatus> {
        if self.is_terminal() {
            return Err(EngineError::IllegalTransition(format!(
                "appointment is {self}; no transition leaves a terminal state"
            )));
        }
        if !self.can_transition_to(target) {
            return Err(EngineError::IllegalTransition(format!(
                "cannot move appointment from {self} to {target}"
            )));
        }
        Ok(target)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AppointmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            "no_show" => Ok(Self::NoShow),
            other => Err(EngineError::InvalidId(format!(
                "invalid appointment status: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use AppointmentStatus::*;

    #[test]
    fn start_then_finish() {
        let status = Scheduled.transition(InProgress).unwrap();
        assert_eq!(status, InProgress);
        assert_eq!(status.transition(Completed).unwrap(), Completed);
    }

    #[test]
    fn cancel_from_every_non_terminal_state() {
        for status in [Scheduled, Confirmed, InProgress] {
            assert_eq!(status.transition(Canceled).unwrap(), Canceled);
        }
    }

    #[test]
    fn confirmed_behaves_like_scheduled() {
        assert_eq!(Scheduled.transition(Confirmed).unwrap(), Confirmed);
        assert_eq!(Confirmed.transition(InProgress).unwrap(), InProgress);
        assert_eq!(Confirmed.transition(NoShow).unwrap(), NoShow);
    }

    #[test]
    fn terminal_states_reject_every_target() {
        for from in [Completed, Canceled, NoShow] {
            assert!(from.is_terminal());
            for to in AppointmentStatus::ALL {
                assert!(matches!(
                    from.transition(to),
                    Err(EngineError::IllegalTransition(_))
                ));
            }
        }
    }

    #[test]
    fn skipping_in_progress_is_illegal() {
        assert!(matches!(
            Scheduled.transition(Completed),
            Err(EngineError::IllegalTransition(_))
        ));
        assert!(matches!(
            InProgress.transition(InProgress),
            Err(EngineError::IllegalTransition(_))
        ));
        assert!(matches!(
            InProgress.transition(Scheduled),
            Err(EngineError::IllegalTransition(_))
        ));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in AppointmentStatus::ALL {
            assert_eq!(AppointmentStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(AppointmentStatus::try_from("agendado").is_err());
    }
}
