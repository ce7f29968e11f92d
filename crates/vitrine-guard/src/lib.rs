//! Helpers behind a vitrine site's browser modules.
//!
//! Escaping, input validation, CSRF tokens, rate limiting, theme selection and
//! authentication gating, written as plain functions. Host state (session or
//! local storage, the identity backend) is passed in explicitly.

pub mod csrf;
pub mod escape;
pub mod ratelimit;
pub mod session;
pub mod store;
pub mod theme;
pub mod validate;

pub use session::{Access, GuardError, IdentityService, User};
pub use store::{MemoryStorage, Storage};
pub use theme::Theme;
