//! Token model, issuance and validation.

pub mod claims;
pub mod issuer;
pub mod validator;

pub use claims::{TokenClaims, TokenType};
pub use issuer::{IssuedToken, TokenIssuer, TokenPair};
pub use validator::TokenValidator;
