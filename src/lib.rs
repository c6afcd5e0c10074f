//! Cosmos API: REST backend for a fictional astronomical catalog (users, planetary systems,
//! stars, planets, compounds) on PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod sync;

pub use config::{resource_by_path, QueryConfig, ResourceDef};
pub use error::AppError;
pub use response::{success_many, success_one};
pub use routes::{common_routes, common_routes_with_ready, resource_routes};
pub use service::{CrudService, Page};
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema};
