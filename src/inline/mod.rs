//! CSS inlining of rendered email HTML.
//!
//! Email clients (and raw previews) ignore `<style>` blocks, so the store's
//! email stylesheet is written into per-element `style` attributes before the
//! HTML is shown.
//!
//! ## Pipeline
//!
//! 1. The base stylesheet (`templates/email-styles.css`) is passed through
//!    every [`StylesheetFilter`].
//! 2. The [`InlineEngine`] resolves the stylesheet against the document.
//! 3. Every [`PostInlineHook`] may edit the in-progress [`InlineContext`].
//! 4. Elements whose inline style resolves to `display: none` are removed,
//!    together with `<script>` elements.
//! 5. Presentation attributes (`bgcolor`, `align`, `width`, ...) are added
//!    for clients that ignore parts of the `style` attribute.
//!
//! Inlining never fails the preview. Without an engine the stylesheet is
//! prepended as a `<style>` block; if the engine errors, the original HTML is
//! returned and the error is logged with `source = "css_inliner"`.
//!
//! # Example
//!
//! ```rust,ignore
//! use mailproof::StyleInliner;
//!
//! let inliner = StyleInliner::new()
//!     .with_stylesheet_filter(|css: String| css + "h1 { color: #222; }")
//!     .with_hook(|ctx: &mut mailproof::InlineContext<'_>| {
//!         ctx.html = ctx.html.replace("{{year}}", "2024");
//!     });
//!
//! let html = inliner.inline("<h1>Hello</h1>");
//! ```

mod attributes;
mod engine;
mod markup;
mod prune;

use std::fmt;

use crate::error::PreviewError;
use crate::template::RenderedContent;

#[cfg(feature = "inline")]
pub use engine::CssInlineEngine;
pub use engine::InlineEngine;

/// The store's default email stylesheet.
pub const DEFAULT_EMAIL_STYLES: &str = include_str!("../../templates/email-styles.css");

/// Filters the stylesheet before inlining.
///
/// For simple cases, use a closure:
///
/// ```rust,ignore
/// inliner.with_stylesheet_filter(|css: String| css.replace("#7f54b3", "#0a7d55"))
/// ```
pub trait StylesheetFilter: Send + Sync {
    fn filter(&self, css: String) -> String;
}

impl<F> StylesheetFilter for F
where
    F: Fn(String) -> String + Send + Sync,
{
    fn filter(&self, css: String) -> String {
        (self)(css)
    }
}

/// In-progress inlining state handed to [`PostInlineHook`]s.
#[derive(Debug)]
pub struct InlineContext<'a> {
    /// Markup with styles inlined, before pruning.
    pub html: String,
    /// The stylesheet that was applied.
    pub css: &'a str,
}

/// Runs after the engine pass, before hidden elements are pruned.
pub trait PostInlineHook: Send + Sync {
    fn after_inline(&self, ctx: &mut InlineContext<'_>);
}

impl<F> PostInlineHook for F
where
    F: Fn(&mut InlineContext<'_>) + Send + Sync,
{
    fn after_inline(&self, ctx: &mut InlineContext<'_>) {
        (self)(ctx)
    }
}

/// Post-processes rendered HTML so its styles survive outside the store.
pub struct StyleInliner {
    base_css: String,
    filters: Vec<Box<dyn StylesheetFilter>>,
    hooks: Vec<Box<dyn PostInlineHook>>,
    engine: Option<Box<dyn InlineEngine>>,
}

impl StyleInliner {
    /// Create an inliner with the default stylesheet and the compiled-in
    /// engine (if the `inline` feature is enabled).
    pub fn new() -> Self {
        Self {
            base_css: DEFAULT_EMAIL_STYLES.to_string(),
            filters: Vec::new(),
            hooks: Vec::new(),
            engine: engine::default_engine(),
        }
    }

    /// Replace the base stylesheet.
    pub fn with_base_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.base_css = css.into();
        self
    }

    /// Add a stylesheet filter. Filters run in the order they were added.
    pub fn with_stylesheet_filter<F: StylesheetFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Add a hook that runs after the engine pass.
    pub fn with_hook<H: PostInlineHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Use a specific engine.
    pub fn with_engine<E: InlineEngine + 'static>(mut self, engine: E) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Use the fallback path: prepend the stylesheet as a `<style>` block.
    pub fn without_engine(mut self) -> Self {
        self.engine = None;
        self
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// The filtered stylesheet.
    pub fn stylesheet(&self) -> String {
        self.filters
            .iter()
            .fold(self.base_css.clone(), |css, filter| filter.filter(css))
    }

    /// Inline the stylesheet into `html`. Never fails.
    pub fn inline(&self, html: &str) -> String {
        let css = self.stylesheet();

        let Some(engine) = self.engine.as_deref() else {
            tracing::debug!("No inlining engine, prepending stylesheet");
            return format!("<style type=\"text/css\">{}</style>{}", css, html);
        };

        match self.inline_with(engine, html, &css) {
            Ok(inlined) => inlined,
            Err(e) => {
                tracing::error!(
                    source = "css_inliner",
                    engine = engine.name(),
                    error = %e,
                    "CSS inlining failed, using original markup"
                );
                html.to_string()
            }
        }
    }

    fn inline_with(
        &self,
        engine: &dyn InlineEngine,
        html: &str,
        css: &str,
    ) -> Result<String, PreviewError> {
        let html = engine.inline(html, css)?;

        let mut ctx = InlineContext { html, css };
        for hook in &self.hooks {
            hook.after_inline(&mut ctx);
        }

        let pruned = prune::remove_hidden(&ctx.html);
        Ok(attributes::add_visual_attributes(&pruned))
    }

    /// Inline HTML content; plain text passes through untouched.
    pub fn process(&self, content: RenderedContent) -> RenderedContent {
        if !content.content_type.is_html() {
            return content;
        }
        RenderedContent {
            body: self.inline(&content.body),
            content_type: content.content_type,
        }
    }
}

impl Default for StyleInliner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StyleInliner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleInliner")
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .field("filters", &self.filters.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ContentType;

    struct FailingEngine;

    impl InlineEngine for FailingEngine {
        fn inline(&self, _html: &str, _css: &str) -> Result<String, PreviewError> {
            Err(PreviewError::Inline("unbalanced markup".into()))
        }
    }

    /// Writes a fixed marker instead of inlining, so tests don't depend on
    /// the real engine's serialization.
    struct EchoEngine;

    impl InlineEngine for EchoEngine {
        fn inline(&self, html: &str, _css: &str) -> Result<String, PreviewError> {
            Ok(html.replace("<p class=\"hide\">", "<p style=\"display: none\">"))
        }
    }

    #[test]
    fn test_fallback_prepends_stylesheet() {
        let inliner = StyleInliner::new()
            .with_base_stylesheet("p { color: red; }")
            .without_engine();
        assert!(!inliner.has_engine());
        assert_eq!(
            inliner.inline("<p>Hi</p>"),
            "<style type=\"text/css\">p { color: red; }</style><p>Hi</p>"
        );
    }

    #[test]
    fn test_failing_engine_returns_original() {
        let html = "<div><p>Order total: $10.00</p>";
        let inliner = StyleInliner::new().with_engine(FailingEngine);
        assert_eq!(inliner.inline(html), html);
    }

    #[test]
    fn test_filters_run_in_order() {
        let inliner = StyleInliner::new()
            .with_base_stylesheet("a")
            .with_stylesheet_filter(|css: String| css + "b")
            .with_stylesheet_filter(|css: String| css.to_uppercase());
        assert_eq!(inliner.stylesheet(), "AB");
    }

    #[test]
    fn test_hooks_run_before_pruning() {
        let inliner = StyleInliner::new()
            .with_engine(EchoEngine)
            .with_hook(|ctx: &mut InlineContext<'_>| {
                ctx.html = ctx.html.replace("<span>", "<span style=\"display:none\">");
            });

        let out = inliner.inline("<p class=\"hide\">a</p><span>b</span><p>c</p>");
        assert_eq!(out, "<p>c</p>");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let inliner = StyleInliner::new().with_engine(FailingEngine);
        let content = RenderedContent::new("Total: $10 <not html>", ContentType::Plain);
        assert_eq!(inliner.process(content.clone()), content);
    }

    #[test]
    fn test_default_stylesheet_hides_preheader() {
        assert!(DEFAULT_EMAIL_STYLES.contains(".preheader"));
        assert!(DEFAULT_EMAIL_STYLES.contains("display: none"));
    }

    #[cfg(feature = "inline")]
    #[test]
    fn test_css_inline_engine() {
        let inliner = StyleInliner::new().with_base_stylesheet(
            ".hidden { display: none } td { text-align: center; background-color: #eeeeee }",
        );
        let out = inliner.inline(
            "<html><head></head><body><div class=\"hidden\">gone</div><table><tr><td>kept</td></tr></table></body></html>",
        );

        assert!(!out.contains("gone"));
        assert!(out.contains("kept"));
        assert!(out.contains("text-align"));
        assert!(out.contains("align=\"center\""));
        assert!(out.contains("bgcolor=\"#eeeeee\""));
    }
}
