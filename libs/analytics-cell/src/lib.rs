pub mod models;
pub mod metrics;
pub mod handlers;
pub mod router;
pub mod services;

pub use models::*;
pub use handlers::*;
pub use router::*;
