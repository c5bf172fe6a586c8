//! Core traits defined in `tollgate-core` and implemented by other crates.

pub mod cache;
pub mod password;
pub mod user_store;

pub use cache::CacheProvider;
pub use password::PasswordHasher;
pub use user_store::UserStore;
