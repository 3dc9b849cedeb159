use std::fmt;

use crate::models::assignment::AssignmentStatus;
use crate::models::freight::FreightStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Accept,
    Confirm,
    Reject,
    ConfirmPickup,
    ConfirmDelivery,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Accept => "accept",
            LifecycleEvent::Confirm => "confirm",
            LifecycleEvent::Reject => "reject",
            LifecycleEvent::ConfirmPickup => "confirm_pickup",
            LifecycleEvent::ConfirmDelivery => "confirm_delivery",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: FreightStatus,
    pub to: FreightStatus,
    pub assignment: Option<AssignmentStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub event: LifecycleEvent,
    pub from: FreightStatus,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} a freight that is {}", self.event, self.from)
    }
}

impl std::error::Error for IllegalTransition {}

impl FreightStatus {
    pub fn apply(self, event: LifecycleEvent) -> Result<Transition, IllegalTransition> {
        use AssignmentStatus as A;
        use FreightStatus as F;
        use LifecycleEvent as E;

        let (to, assignment) = match (self, event) {
            (F::Available, E::Accept) => (F::PendingConfirmation, Some(A::PendingConfirmation)),
            (F::PendingConfirmation, E::Confirm) => (F::Confirmed, Some(A::Confirmed)),
            (F::PendingConfirmation, E::Reject) => (F::Available, Some(A::Rejected)),
            (F::Confirmed, E::ConfirmPickup) => (F::InTransit, None),
            (F::InTransit, E::ConfirmDelivery) => (F::Delivered, None),
            (from, event) => return Err(IllegalTransition { event, from }),
        };

        Ok(Transition {
            from: self,
            to,
            assignment,
        })
    }

    pub fn is_deletable(self) -> bool {
        matches!(self, FreightStatus::Available)
    }
}
