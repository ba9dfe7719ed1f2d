pub mod auth;
pub mod form;
pub mod json;
pub mod signed;
