//! HTTP API definitions.
//!
//! | Route                     | Handler              |
//! |---------------------------|----------------------|
//! | `POST /api/user/register` | [`user::register()`] |
//! | `POST /api/user/login`    | [`user::login()`]    |
//! | `POST /api/user/orders`   | [`order::upload()`]  |
//! | `GET /api/user/orders`    | [`order::list()`]    |

pub mod order;
pub mod user;

pub use self::{order::Order, user::Credentials};
