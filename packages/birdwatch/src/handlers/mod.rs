pub mod auth;
pub mod bird;
