//! Carbon footprint tracking backend: users, shared campaigns, vehicles and their usage history,
//! with fuel-economy conversion and per-kilometre CO2 estimates.

pub mod calc;
pub mod config;
pub mod date;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{Settings, StorageKind};
pub use error::{AppError, ConfigError};
pub use routes::app;
pub use state::AppState;
pub use store::{admin_connect_options, ensure_database_exists, MemoryStore, PgStore, Store};
