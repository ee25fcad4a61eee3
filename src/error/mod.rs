/**
 * Backend Error Types
 *
 * This module defines the error taxonomy used by every HTTP handler:
 * validation, authentication, authorization, not-found, conflict, and
 * internal errors. Errors convert into JSON HTTP responses.
 */

pub mod types;
pub mod conversion;

pub use types::ApiError;
