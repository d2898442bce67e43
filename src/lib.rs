//! # Mailproof
//!
//! Preview store email notifications exactly as customers receive them,
//! rendered against a real order, styles inlined.
//!
//! ## Quick Start
//!
//! Set environment variables:
//! ```bash
//! PREVIEW_SECRET=change-me
//! PREVIEW_SITE_TITLE="Tea Shop"
//! PREVIEW_LOCALES=nl_NL,de_DE
//! ```
//!
//! Build a handler and route requests to it:
//! ```rust,ignore
//! use mailproof::{MemoryOrderStore, PreviewHandler, PreviewRequest, Principal};
//!
//! let orders = MemoryOrderStore::shared();
//! let handler = PreviewHandler::from_env(orders)?;
//!
//! let request = PreviewRequest::from_query(query)?;
//! if let Some(response) = handler.handle(&Principal::store_manager("1"), &request) {
//!     // The response is the whole reply.
//! }
//! ```
//!
//! Preview links for the settings page come from
//! [`PreviewHandler::preview_url`] or [`admin::preview_cell`].
//!
//! ## Extending
//!
//! ```rust,ignore
//! use mailproof::{PreviewHandler, StyleInliner, TemplateId};
//!
//! let handler = PreviewHandler::builder("secret", orders)
//!     .configure_registry(|r| {
//!         r.register("renewal_reminder", TemplateId::new("Shop_Email_Renewal_Reminder"));
//!     })
//!     .configure_templates(|t| {
//!         t.register(RenewalReminder::new());
//!     })
//!     .inliner(StyleInliner::new().with_stylesheet_filter(|css: String| css + BRAND_CSS))
//!     .build();
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `PREVIEW_SECRET` | Key for signing preview tokens (required) |
//! | `PREVIEW_NONCE_TTL` | Token lifetime in seconds (default: 86400) |
//! | `PREVIEW_ONE_TIME_NONCES` | Reject reused tokens (default: true) |
//! | `PREVIEW_SITE_TITLE` | Value of `{site_title}` (default: Store) |
//! | `PREVIEW_DEFAULT_LOCALE` | Locale outside previews (default: en) |
//! | `PREVIEW_LOCALES` | Comma-separated locales available for `lang` |
//! | `PREVIEW_ADMIN_USER` | User the development servers act as (default: admin) |
//!
//! ## Feature Flags
//!
//! - `inline` - CSS inlining via css-inline (default)
//! - `preview` - Standalone preview server via tiny_http
//! - `preview-axum` - Axum router for the preview endpoint
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//! - `dev` - Enables inline and preview
//! - `full` - Everything
//!
//! ## Metrics
//!
//! Enable `features = ["metrics"]` to emit Prometheus-style metrics:
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `mailproof_previews_total` | Counter | email_type, status | Preview requests handled |
//! | `mailproof_render_duration_seconds` | Histogram | email_type | Render and inline duration |
//!
//! Install a recorder (e.g., `metrics-exporter-prometheus`) in your app to collect them.

/// The version of the mailproof crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod admin;
mod auth;
mod config;
mod error;
mod handler;
pub mod inline;
mod locale;
mod order;
mod registry;
mod renderer;
mod template;

#[cfg(any(feature = "preview", feature = "preview-axum"))]
pub mod preview;

// Re-exports
pub use admin::RequestUrl;
pub use auth::{
    scope_for, Authorization, DenyReason, NonceAuthority, Principal, DEFAULT_TOKEN_TTL,
    MANAGE_STORE, MAX_TOKEN_TTL,
};
pub use config::{is_configured, PreviewSettings};
pub use error::PreviewError;
pub use handler::{
    PreviewHandler, PreviewHandlerBuilder, PreviewRequest, PreviewResponse, PREVIEW_ACTION,
};
pub use inline::{InlineContext, InlineEngine, PostInlineHook, StyleInliner, StylesheetFilter};
pub use locale::{LocaleGuard, LocaleSwitcher, SharedLocale};
pub use order::{
    BillingDetails, LineItem, MemoryOrderStore, Money, Order, OrderStatus, OrderStore,
};
pub use registry::{EmailTypeRegistry, RegistryExtension, TemplateId, DEFAULT_EMAIL_TYPES};
pub use renderer::ContentRenderer;
pub use template::{
    ContentType, EmailTemplate, OrderEmail, RenderContext, RenderedContent, TemplateSet,
};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ContentType, EmailTemplate, EmailTypeRegistry, MemoryOrderStore, Order, OrderStore,
        PreviewError, PreviewHandler, PreviewRequest, PreviewResponse, Principal,
        RenderContext, StyleInliner, TemplateId,
    };
}
