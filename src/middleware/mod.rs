mod guards;
mod json_error;
mod panic;

pub use guards::{AuthGuard, AuthRoleGuard, subject_id};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
