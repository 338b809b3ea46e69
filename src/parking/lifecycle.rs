//! Reservation and spot status machine.
//!
//! A reservation moves `reserved -> active -> completed`, with `cancelled`
//! reachable from either non-terminal state. The matching spot states are
//! `available`, `reserved` (claimed but not parked) and `occupied`.
//! Transitions are validated here, detached from any persistence, so route
//! and service code can only perform moves this table allows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Reserved,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "available",
            SpotStatus::Reserved => "reserved",
            SpotStatus::Occupied => "occupied",
        }
    }
}

impl TryFrom<&str> for SpotStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "available" => Ok(SpotStatus::Available),
            "reserved" => Ok(SpotStatus::Reserved),
            "occupied" => Ok(SpotStatus::Occupied),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Reserved,
    Active,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Active => "active",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled reservations never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled
        )
    }

    /// A live reservation is one still holding a spot.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

impl TryFrom<&str> for ReservationStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "reserved" => Ok(ReservationStatus::Reserved),
            "active" => Ok(ReservationStatus::Active),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Park,
    Release,
    Cancel,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Park => "park",
            LifecycleEvent::Release => "release",
            LifecycleEvent::Cancel => "cancel",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TransitionError {
    pub from: ReservationStatus,
    pub event: LifecycleEvent,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} a {} reservation",
            self.event.as_str(),
            self.from.as_str()
        )
    }
}

impl std::error::Error for TransitionError {}

/// Returns the state a reservation enters when `event` is applied to
/// `current`, or an error when the move is not allowed. This is the only
/// transition table; callers must not mutate status fields directly.
pub fn transition(
    current: ReservationStatus,
    event: LifecycleEvent,
) -> Result<ReservationStatus, TransitionError> {
    match (current, event) {
        (ReservationStatus::Reserved, LifecycleEvent::Park) => Ok(ReservationStatus::Active),
        (ReservationStatus::Active, LifecycleEvent::Release) => Ok(ReservationStatus::Completed),
        (ReservationStatus::Reserved, LifecycleEvent::Cancel)
        | (ReservationStatus::Active, LifecycleEvent::Cancel) => {
            Ok(ReservationStatus::Cancelled)
        }
        (from, event) => Err(TransitionError { from, event }),
    }
}

/// Spot state matching a reservation state, used when both rows are written
/// in the same transaction.
pub fn spot_status_for(reservation: ReservationStatus) -> SpotStatus {
    match reservation {
        ReservationStatus::Reserved => SpotStatus::Reserved,
        ReservationStatus::Active => SpotStatus::Occupied,
        ReservationStatus::Completed | ReservationStatus::Cancelled => SpotStatus::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LifecycleEvent, ReservationStatus, SpotStatus, spot_status_for, transition,
    };

    #[test]
    fn happy_path_reserved_to_completed() {
        let active = transition(ReservationStatus::Reserved, LifecycleEvent::Park)
            .expect("park should be allowed");
        assert_eq!(active, ReservationStatus::Active);

        let completed = transition(active, LifecycleEvent::Release)
            .expect("release should be allowed");
        assert_eq!(completed, ReservationStatus::Completed);
        assert!(completed.is_terminal());
    }

    #[test]
    fn cancel_allowed_from_both_live_states() {
        assert_eq!(
            transition(ReservationStatus::Reserved, LifecycleEvent::Cancel),
            Ok(ReservationStatus::Cancelled)
        );
        assert_eq!(
            transition(ReservationStatus::Active, LifecycleEvent::Cancel),
            Ok(ReservationStatus::Cancelled)
        );
    }

    #[test]
    fn release_requires_active() {
        for from in [
            ReservationStatus::Reserved,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ] {
            let err = transition(from, LifecycleEvent::Release)
                .expect_err("release should be rejected");
            assert_eq!(err.from, from);
        }
    }

    #[test]
    fn terminal_states_reject_every_event() {
        for from in [ReservationStatus::Completed, ReservationStatus::Cancelled] {
            for event in [
                LifecycleEvent::Park,
                LifecycleEvent::Release,
                LifecycleEvent::Cancel,
            ] {
                assert!(transition(from, event).is_err());
            }
        }
    }

    #[test]
    fn double_release_is_rejected_by_state_guard() {
        let completed = transition(ReservationStatus::Active, LifecycleEvent::Release)
            .expect("first release should pass");
        let err = transition(completed, LifecycleEvent::Release)
            .expect_err("second release should fail");
        assert_eq!(err.to_string(), "cannot release a completed reservation");
    }

    #[test]
    fn spot_status_follows_reservation_status() {
        assert_eq!(
            spot_status_for(ReservationStatus::Reserved),
            SpotStatus::Reserved
        );
        assert_eq!(
            spot_status_for(ReservationStatus::Active),
            SpotStatus::Occupied
        );
        assert_eq!(
            spot_status_for(ReservationStatus::Completed),
            SpotStatus::Available
        );
        assert_eq!(
            spot_status_for(ReservationStatus::Cancelled),
            SpotStatus::Available
        );
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ReservationStatus::Reserved,
            ReservationStatus::Active,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(ReservationStatus::try_from("parked").is_err());

        for status in [
            SpotStatus::Available,
            SpotStatus::Reserved,
            SpotStatus::Occupied,
        ] {
            assert_eq!(SpotStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(SpotStatus::try_from("A").is_err());
    }
}
