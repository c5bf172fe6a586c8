//! Token configuration.

use serde::{Deserialize, Serialize};

/// Secrets, lifetimes and the scheme label of issued tokens.
///
/// Refresh tokens are expected to outlive access tokens; this is a policy
/// of the deployment and is only warned about, never enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    #[serde(default = "default_access_secret")]
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens. Should differ from the access secret.
    #[serde(default = "default_refresh_secret")]
    pub refresh_token_secret: String,
    /// Access token lifetime in hours.
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_hours: u32,
    /// Refresh token lifetime in hours.
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_hours: u32,
    /// Label prepended to every issued token.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: default_access_secret(),
            refresh_token_secret: default_refresh_secret(),
            access_token_expiry_hours: default_access_expiry(),
            refresh_token_expiry_hours: default_refresh_expiry(),
            token_prefix: default_token_prefix(),
        }
    }
}

fn default_access_secret() -> String {
    "CHANGE_ME_ACCESS_SECRET".to_string()
}

fn default_refresh_secret() -> String {
    "CHANGE_ME_REFRESH_SECRET".to_string()
}

fn default_access_expiry() -> u32 {
    2
}

fn default_refresh_expiry() -> u32 {
    168
}

fn default_token_prefix() -> String {
    "Bearer ".to_string()
}
