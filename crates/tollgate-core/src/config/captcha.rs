//! Login captcha configuration.

use serde::{Deserialize, Serialize};

/// Captcha rendering and gating settings.
///
/// The five-minute validity window is fixed and not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Whether `/auth/login` requires a solved captcha.
    #[serde(default = "default_required")]
    pub required_for_login: bool,
    /// Name of the cookie carrying the captcha session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Rendered image width in pixels.
    #[serde(default = "default_width")]
    pub image_width: u32,
    /// Rendered image height in pixels.
    #[serde(default = "default_height")]
    pub image_height: u32,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            required_for_login: default_required(),
            cookie_name: default_cookie_name(),
            image_width: default_width(),
            image_height: default_height(),
        }
    }
}

fn default_required() -> bool {
    true
}

fn default_cookie_name() -> String {
    "captcha_session".to_string()
}

fn default_width() -> u32 {
    200
}

fn default_height() -> u32 {
    80
}
