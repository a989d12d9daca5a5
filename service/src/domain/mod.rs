//! Domain definitions.

pub mod order;
pub mod user;

pub use self::{order::Order, user::User};
