pub mod app;
pub mod audit;
pub mod authz;
pub mod db;
pub mod docs;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod notify;
pub mod routes;
pub mod store;
pub mod workflow;

// Re-export commonly used items for tests
pub use app::{build_router, create_app, AppState};
