pub mod auth_service;
pub mod context;
pub mod lot_service;
pub mod reservation_service;
pub mod stats_service;
pub mod user_service;

pub use context::ServiceContext;
