//! Access and refresh tokens.

pub mod claims;
pub mod codec;
pub mod issuer;
pub mod verifier;

pub use claims::{AccessClaims, RefreshClaims, TokenClaims, TokenType};
pub use issuer::{TokenIssuer, TokenPair, TokenSettings};
pub use verifier::TokenVerifier;
