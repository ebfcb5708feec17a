pub mod auth;
pub mod error;
pub mod time;

pub use auth::{AccessError, AuthContext, Identity, User, UserRole};
pub use error::AppError;
pub use time::TimeOfDay;
