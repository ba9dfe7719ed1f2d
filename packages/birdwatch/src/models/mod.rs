pub mod auth;
pub mod bird;
pub mod form;
