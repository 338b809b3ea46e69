pub mod lifecycle;
pub mod pricing;
pub mod stats;
pub mod validate;

pub use lifecycle::{LifecycleEvent, ReservationStatus, SpotStatus, TransitionError};
