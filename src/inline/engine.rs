//! Structural CSS inlining engines.

use crate::error::PreviewError;

/// Resolves a stylesheet against a document and writes the result into
/// `style` attributes.
pub trait InlineEngine: Send + Sync {
    /// Inline `css` into `html`, returning the serialized document.
    fn inline(&self, html: &str, css: &str) -> Result<String, PreviewError>;

    /// Engine name (for logging).
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Engine backed by the `css-inline` crate.
///
/// Remote stylesheets are never fetched; only the email stylesheet and any
/// `<style>` blocks already in the document are applied.
#[cfg(feature = "inline")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CssInlineEngine;

#[cfg(feature = "inline")]
impl CssInlineEngine {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "inline")]
impl InlineEngine for CssInlineEngine {
    fn inline(&self, html: &str, css: &str) -> Result<String, PreviewError> {
        let inliner = css_inline::CSSInliner::options()
            .load_remote_stylesheets(false)
            .extra_css(Some(std::borrow::Cow::Borrowed(css)))
            .build();

        Ok(inliner.inline(html)?)
    }

    fn name(&self) -> &'static str {
        "css-inline"
    }
}

/// The engine compiled into this build, if any.
pub(crate) fn default_engine() -> Option<Box<dyn InlineEngine>> {
    #[cfg(feature = "inline")]
    {
        return Some(Box::new(CssInlineEngine::new()));
    }
    #[allow(unreachable_code)]
    None
}
