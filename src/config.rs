//! Environment-based configuration.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Principal, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};
use crate::error::PreviewError;
use crate::handler::{PreviewHandler, PreviewHandlerBuilder};
use crate::locale::SharedLocale;
use crate::order::OrderStore;

/// Settings read from `PREVIEW_*` environment variables.
#[derive(Clone)]
pub struct PreviewSettings {
    pub secret: String,
    pub token_ttl: Duration,
    pub one_time_tokens: bool,
    pub site_title: String,
    pub default_locale: String,
    pub locales: Vec<String>,
    pub admin_user: String,
}

impl PreviewSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, PreviewError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Read settings through `lookup` instead of the process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, PreviewError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("PREVIEW_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PreviewError::Configuration("PREVIEW_SECRET not set".into()))?;

        let token_ttl = match lookup("PREVIEW_NONCE_TTL") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PreviewError::Configuration(format!(
                        "PREVIEW_NONCE_TTL must be a number of seconds, got {:?}",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(PreviewError::Configuration(
                        "PREVIEW_NONCE_TTL must be greater than zero".into(),
                    ));
                }
                if secs > MAX_TOKEN_TTL.as_secs() {
                    return Err(PreviewError::Configuration(format!(
                        "PREVIEW_NONCE_TTL must be at most {} seconds",
                        MAX_TOKEN_TTL.as_secs()
                    )));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TOKEN_TTL,
        };

        let one_time_tokens = match lookup("PREVIEW_ONE_TIME_NONCES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                PreviewError::Configuration(format!(
                    "PREVIEW_ONE_TIME_NONCES must be true or false, got {:?}",
                    raw
                ))
            })?,
            None => true,
        };

        let site_title = lookup("PREVIEW_SITE_TITLE").unwrap_or_else(|| "Store".to_string());
        let default_locale = lookup("PREVIEW_DEFAULT_LOCALE")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "en".to_string());

        let locales = lookup("PREVIEW_LOCALES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let admin_user = lookup("PREVIEW_ADMIN_USER")
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "admin".to_string());

        tracing::debug!(
            token_ttl = token_ttl.as_secs(),
            one_time_tokens,
            default_locale = %default_locale,
            locales = ?locales,
            "Loaded preview settings"
        );

        Ok(Self {
            secret,
            token_ttl,
            one_time_tokens,
            site_title,
            default_locale,
            locales,
            admin_user,
        })
    }

    /// The locale switcher these settings describe.
    pub fn locale(&self) -> SharedLocale {
        SharedLocale::new(self.default_locale.clone()).supported(self.locales.iter().cloned())
    }

    /// The principal the development servers act as.
    pub fn principal(&self) -> Principal {
        Principal::store_manager(self.admin_user.clone())
    }

    /// A handler builder preconfigured from these settings.
    pub fn handler_builder(&self, orders: Arc<dyn OrderStore>) -> PreviewHandlerBuilder {
        PreviewHandler::builder(self.secret.as_bytes(), orders)
            .token_ttl(self.token_ttl)
            .one_time_tokens(self.one_time_tokens)
            .site_title(self.site_title.clone())
            .locale(Arc::new(self.locale()))
    }
}

impl std::fmt::Debug for PreviewSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSettings")
            .field("secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("one_time_tokens", &self.one_time_tokens)
            .field("site_title", &self.site_title)
            .field("default_locale", &self.default_locale)
            .field("locales", &self.locales)
            .field("admin_user", &self.admin_user)
            .finish()
    }
}

impl PreviewHandler {
    /// Build a handler from `PREVIEW_*` environment variables.
    pub fn from_env(orders: Arc<dyn OrderStore>) -> Result<Self, PreviewError> {
        Ok(PreviewSettings::from_env()?.handler_builder(orders).build())
    }
}

/// Check if previews are configured (`PREVIEW_SECRET` is set).
pub fn is_configured() -> bool {
    env::var("PREVIEW_SECRET").map(|s| !s.is_empty()).unwrap_or(false)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
