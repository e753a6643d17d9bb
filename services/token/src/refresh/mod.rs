//! Refresh token rotation.

pub mod rotator;

pub use rotator::RefreshRotator;
