pub mod admin;
pub mod auth;
pub mod jobs;
pub mod lots;
pub mod public;
pub mod reservations;
pub mod users;
