pub mod handlers;
pub mod models;
pub mod password;
pub mod router;

pub use models::*;
pub use router::*;
