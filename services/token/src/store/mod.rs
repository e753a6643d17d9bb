//! Cache-backed stores: revocation list, refresh sessions, login attempts.

pub mod attempts;
pub mod revocation;
pub mod session;

pub use attempts::LoginAttemptGuard;
pub use revocation::RevocationStore;
pub use session::RefreshSessionStore;
