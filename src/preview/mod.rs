//! Preview servers for development.
//!
//! Mount the preview endpoint into an Axum app (`preview-axum`) or run it
//! standalone on tiny_http (`preview`).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mailproof::{MemoryOrderStore, PreviewHandler, Principal};
//! use mailproof::preview::preview_router;
//! use axum::Router;
//!
//! let handler = Arc::new(PreviewHandler::builder("secret", MemoryOrderStore::shared()).build());
//!
//! let app = Router::new()
//!     .nest("/admin/emails", preview_router(handler, Principal::store_manager("admin")));
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Email settings page with preview links |
//! | GET | `/?action=preview_email&type=..&order=..&nonce=..` | Raw email preview |
//! | GET | `/json` | Registered email types as JSON |

mod core;

#[cfg(feature = "preview-axum")]
mod axum_routes;

#[cfg(feature = "preview")]
mod standalone;

pub use self::core::{list_email_types, EmailTypeInfo, EmailTypesResponse};

#[cfg(feature = "preview")]
pub use standalone::{serve, PreviewServer};

#[cfg(feature = "preview-axum")]
use std::sync::Arc;

#[cfg(feature = "preview-axum")]
use crate::{auth::Principal, handler::PreviewHandler};

/// Create an Axum router for the preview endpoint.
///
/// Requests are handled as `principal`; mount the router behind the
/// application's own admin authentication.
#[cfg(feature = "preview-axum")]
pub fn preview_router(handler: Arc<PreviewHandler>, principal: Principal) -> axum::Router {
    axum_routes::create_router(handler, principal)
}

/// Axum types used to drive the router in tests.
#[cfg(feature = "preview-axum")]
pub mod reexports {
    pub use axum::body::Body;
    pub use axum::Router;
    pub use axum::http::{header, Request, StatusCode};
}
