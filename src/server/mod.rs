//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server:
//!
//! - **`config`** - environment-driven configuration and database setup
//! - **`state`** - `AppState` and `FromRef` implementations
//! - **`init`** - app construction and background tasks

pub mod config;
pub mod init;
pub mod state;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
