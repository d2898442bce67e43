//! Content rendering: template + order → raw email body.

use std::sync::Arc;

use crate::error::PreviewError;
use crate::locale::{LocaleGuard, LocaleSwitcher};
use crate::order::OrderStore;
use crate::registry::TemplateId;
use crate::template::{RenderContext, RenderedContent, TemplateSet};

/// Locale reported to templates when no switcher is configured.
const FALLBACK_LOCALE: &str = "en";

/// Renders an active template against an existing order.
pub struct ContentRenderer {
    templates: Arc<TemplateSet>,
    orders: Arc<dyn OrderStore>,
    locale: Option<Arc<dyn LocaleSwitcher>>,
    site_title: String,
}

impl ContentRenderer {
    pub fn new(templates: Arc<TemplateSet>, orders: Arc<dyn OrderStore>) -> Self {
        Self {
            templates,
            orders,
            locale: None,
            site_title: "Store".to_string(),
        }
    }

    /// Enable language overrides through the store's switcher.
    pub fn with_locale(mut self, switcher: Arc<dyn LocaleSwitcher>) -> Self {
        self.locale = Some(switcher);
        self
    }

    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    /// Render `template_id` for order `order_id`.
    ///
    /// With `lang` set and a switcher configured, the switcher's locale is
    /// changed for this render only and restored on every exit path.
    pub fn render(
        &self,
        template_id: &TemplateId,
        order_id: u64,
        lang: Option<&str>,
    ) -> Result<RenderedContent, PreviewError> {
        let order = self
            .orders
            .get(order_id)
            .ok_or(PreviewError::OrderNotFound(order_id))?;

        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| PreviewError::TemplateNotActive(template_id.to_string()))?;

        let _guard = match (self.locale.as_deref(), lang) {
            (Some(switcher), Some(lang)) if !lang.is_empty() => {
                Some(LocaleGuard::switch(switcher, lang))
            }
            _ => None,
        };

        let locale = self
            .locale
            .as_ref()
            .map(|s| s.current())
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string());

        let ctx = RenderContext {
            order: &order,
            locale: &locale,
            site_title: &self.site_title,
        };

        tracing::debug!(
            template = %template_id,
            order_id = order_id,
            locale = %locale,
            "Rendering email template"
        );

        template.render(&ctx)
    }
}
