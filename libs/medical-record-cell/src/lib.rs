pub mod chart;
pub mod models;
pub mod handlers;
pub mod router;
pub mod services;

pub use chart::*;
pub use models::*;
pub use handlers::*;
pub use router::*;
