//! The preview request handler.
//!
//! Wires the authorizer, registry, renderer and inliner together. Construct
//! one [`PreviewHandler`] at startup and share it (`Arc`) with the routing
//! layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mailproof::{MemoryOrderStore, PreviewHandler, PreviewRequest, Principal};
//!
//! let orders = MemoryOrderStore::shared();
//! let handler = PreviewHandler::builder("secret", orders).build();
//!
//! let request = PreviewRequest::from_query("action=preview_email&type=new_order&order=42&nonce=...")?;
//! if let Some(response) = handler.handle(&Principal::store_manager("1"), &request) {
//!     // write response.status / response.content_type / response.body
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

use serde::Deserialize;

use crate::auth::{scope_for, Authorization, NonceAuthority, Principal};
use crate::error::PreviewError;
use crate::inline::StyleInliner;
use crate::locale::LocaleSwitcher;
use crate::order::OrderStore;
use crate::registry::EmailTypeRegistry;
use crate::renderer::ContentRenderer;
use crate::template::{RenderedContent, TemplateSet};

/// Value of `action` that selects the preview.
pub const PREVIEW_ACTION: &str = "preview_email";

/// Query parameters of a preview request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(rename = "type", default)]
    pub email_type: Option<String>,
    /// Kept as text so a malformed id reaches the handler as an error.
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

impl PreviewRequest {
    /// Parse a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Result<Self, PreviewError> {
        serde_urlencoded::from_str(query)
            .map_err(|e| PreviewError::BadRequest(e.to_string()))
    }

    /// Whether this request asks for a preview at all.
    pub fn is_preview(&self) -> bool {
        self.action.as_deref() == Some(PREVIEW_ACTION)
    }

    fn email_type(&self) -> &str {
        self.email_type.as_deref().map(str::trim).unwrap_or("")
    }

    fn order_id(&self) -> Result<u64, PreviewError> {
        let raw = self.order.as_deref().map(str::trim).unwrap_or("");
        raw.parse()
            .map_err(|_| PreviewError::InvalidOrderId(raw.to_string()))
    }

    fn lang(&self) -> Option<&str> {
        self.lang.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// A complete HTTP response body. Nothing is wrapped around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl PreviewResponse {
    fn content(content: RenderedContent) -> Self {
        Self {
            status: 200,
            content_type: content.content_type.mime(),
            body: content.body,
        }
    }

    /// Plaintext error response.
    pub fn error(err: &PreviewError) -> Self {
        Self {
            status: err.status(),
            content_type: "text/plain; charset=utf-8",
            body: err.to_string(),
        }
    }
}

/// Handles preview requests.
pub struct PreviewHandler {
    registry: EmailTypeRegistry,
    authority: NonceAuthority,
    renderer: ContentRenderer,
    inliner: StyleInliner,
}

impl PreviewHandler {
    /// Start building a handler.
    pub fn builder(secret: impl AsRef<[u8]>, orders: Arc<dyn OrderStore>) -> PreviewHandlerBuilder {
        PreviewHandlerBuilder::new(secret, orders)
    }

    pub fn registry(&self) -> &EmailTypeRegistry {
        &self.registry
    }

    pub fn authority(&self) -> &NonceAuthority {
        &self.authority
    }

    pub fn renderer(&self) -> &ContentRenderer {
        &self.renderer
    }

    pub fn inliner(&self) -> &StyleInliner {
        &self.inliner
    }

    /// Handle a request.
    ///
    /// Returns `None` when the request is not a preview and should continue
    /// through the normal page pipeline. Otherwise the returned response is
    /// the whole reply.
    pub fn handle(&self, principal: &Principal, request: &PreviewRequest) -> Option<PreviewResponse> {
        if !request.is_preview() {
            return None;
        }

        let email_type = request.email_type();
        let span = tracing::info_span!(
            "mailproof.preview",
            preview_id = %uuid::Uuid::new_v4(),
            email_type = %email_type,
            order_id = ?request.order,
            user = %principal.user_id,
        );
        let _guard = span.enter();

        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = self.preview(principal, request);

        #[cfg(feature = "metrics")]
        {
            let duration = start.elapsed().as_secs_f64();
            let status = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            metrics::counter!("mailproof_previews_total", "email_type" => email_type.to_string(), "status" => status)
                .increment(1);
            metrics::histogram!("mailproof_render_duration_seconds", "email_type" => email_type.to_string())
                .record(duration);
        }

        Some(match result {
            Ok(content) => {
                tracing::info!(
                    content_type = %content.content_type,
                    bytes = content.body.len(),
                    "Email preview rendered"
                );
                PreviewResponse::content(content)
            }
            Err(e) => {
                tracing::info!(error = %e, kind = e.kind(), "Email preview refused");
                PreviewResponse::error(&e)
            }
        })
    }

    /// Run the pipeline: capability, token, type, render, inline.
    pub fn preview(
        &self,
        principal: &Principal,
        request: &PreviewRequest,
    ) -> Result<RenderedContent, PreviewError> {
        if !principal.can_manage_store() {
            tracing::debug!("Missing store management capability");
            return Err(PreviewError::Unauthorized);
        }

        let email_type = request.email_type();
        if let Authorization::Denied(reason) = self
            .authority
            .authorize(request.nonce.as_deref(), &scope_for(email_type))
        {
            tracing::debug!(reason = %reason, "Preview token denied");
            return Err(PreviewError::Unauthorized);
        }

        let template_id = self
            .registry
            .resolve(email_type)
            .ok_or_else(|| PreviewError::UnknownEmailType(email_type.to_string()))?;

        let order_id = request.order_id()?;
        let content = self.renderer.render(template_id, order_id, request.lang())?;

        Ok(self.inliner.process(content))
    }

    /// Issue a preview token for an email type.
    pub fn issue_token(&self, email_type: &str) -> String {
        self.authority.issue(&scope_for(email_type))
    }
}

impl std::fmt::Debug for PreviewHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandler")
            .field("email_types", &self.registry.len())
            .field("templates", self.renderer.templates())
            .field("authority", &self.authority)
            .field("inliner", &self.inliner)
            .finish()
    }
}

/// Builder for [`PreviewHandler`].
pub struct PreviewHandlerBuilder {
    secret: Vec<u8>,
    orders: Arc<dyn OrderStore>,
    registry: EmailTypeRegistry,
    templates: TemplateSet,
    inliner: StyleInliner,
    locale: Option<Arc<dyn LocaleSwitcher>>,
    site_title: Option<String>,
    ttl: Option<Duration>,
    one_time: bool,
}

impl PreviewHandlerBuilder {
    fn new(secret: impl AsRef<[u8]>, orders: Arc<dyn OrderStore>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            orders,
            registry: EmailTypeRegistry::with_defaults(),
            templates: TemplateSet::with_defaults(),
            inliner: StyleInliner::new(),
            locale: None,
            site_title: None,
            ttl: None,
            one_time: true,
        }
    }

    /// Replace the email type registry.
    pub fn registry(mut self, registry: EmailTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add or override email types.
    pub fn configure_registry(mut self, f: impl FnOnce(&mut EmailTypeRegistry)) -> Self {
        f(&mut self.registry);
        self
    }

    /// Replace the active template set.
    pub fn templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    /// Activate additional templates.
    pub fn configure_templates(mut self, f: impl FnOnce(&mut TemplateSet)) -> Self {
        f(&mut self.templates);
        self
    }

    pub fn inliner(mut self, inliner: StyleInliner) -> Self {
        self.inliner = inliner;
        self
    }

    pub fn locale(mut self, switcher: Arc<dyn LocaleSwitcher>) -> Self {
        self.locale = Some(switcher);
        self
    }

    pub fn site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn one_time_tokens(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    pub fn build(self) -> PreviewHandler {
        let mut authority = NonceAuthority::new(&self.secret).one_time(self.one_time);
        if let Some(ttl) = self.ttl {
            authority = authority.ttl(ttl);
        }

        let mut renderer = ContentRenderer::new(Arc::new(self.templates), self.orders);
        if let Some(locale) = self.locale {
            renderer = renderer.with_locale(locale);
        }
        if let Some(title) = self.site_title {
            renderer = renderer.with_site_title(title);
        }

        PreviewHandler {
            registry: self.registry,
            authority,
            renderer,
            inliner: self.inliner,
        }
    }
}
