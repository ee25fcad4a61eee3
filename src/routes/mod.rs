//! Route Configuration
//!
//! - **`api`** - per-resource route tables
//! - **`router`** - composition, middleware, and static services

pub mod api;
pub mod router;

pub use router::create_router;
