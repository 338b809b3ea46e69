pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod lot_dao;
pub mod refresh_token_dao;
pub mod reservation_dao;
pub mod spot_dao;
pub mod user_dao;

pub use base::{DaoBase, DaoPager, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use lot_dao::LotDao;
pub use refresh_token_dao::RefreshTokenDao;
pub use reservation_dao::ReservationDao;
pub use spot_dao::SpotDao;
pub use user_dao::UserDao;
