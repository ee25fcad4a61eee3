/**
 * Identity Resolution
 *
 * Verifies externally issued bearer tokens and maps them to local user
 * records. Unknown-but-valid identities are auto-provisioned on first
 * sight; every authenticated request carries an `AuthUser` extension.
 */

pub mod middleware;
pub mod token;

pub use middleware::{auth_middleware, AuthUser};
pub use token::{verify_token, Claims};
