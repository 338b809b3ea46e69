#[allow(unused_imports)]
pub mod prelude {
    pub use super::parking_lot::Entity as ParkingLot;
    pub use super::parking_spot::Entity as ParkingSpot;
    pub use super::refresh_token::Entity as RefreshToken;
    pub use super::reservation::Entity as Reservation;
    pub use super::user::Entity as User;
}

pub mod parking_lot;
pub mod parking_spot;
pub mod refresh_token;
pub mod reservation;
pub mod user;
