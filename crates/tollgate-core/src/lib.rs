//! # tollgate-core
//!
//! Core crate for Tollgate. Contains the traits implemented by the cache,
//! store and hashing backends, configuration schemas, typed identifiers,
//! the user/principal model, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Tollgate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
