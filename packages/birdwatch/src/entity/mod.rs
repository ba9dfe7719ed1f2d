pub mod bird;
pub mod session;
pub mod user;
