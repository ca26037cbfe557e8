//! API handlers.

pub mod admin;
pub mod health;
pub mod offers;
pub mod users;
