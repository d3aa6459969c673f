pub mod checkin;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod models;
pub mod permission;
pub mod pg_repository;
pub mod progress;
pub mod repository;
pub mod service;

pub use error::OkrError;
pub use handlers::configure_okr_routes;
pub use models::*;
pub use pg_repository::PgRepository;
pub use repository::{MemoryRepository, OkrRepository};
pub use service::OkrService;
