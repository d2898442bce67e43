//! Scoped locale switching.
//!
//! A multilingual store keeps one process-wide "current language". A preview
//! may render in another language, but must leave the setting exactly as it
//! found it, also when rendering fails. [`LocaleGuard`] restores the previous
//! locale when dropped.
//!
//! # Example
//!
//! ```rust
//! use mailproof::{LocaleGuard, LocaleSwitcher, SharedLocale};
//!
//! let locale = SharedLocale::new("en").supported(["en", "nl"]);
//! {
//!     let _guard = LocaleGuard::switch(&locale, "nl");
//!     assert_eq!(locale.current(), "nl");
//! }
//! assert_eq!(locale.current(), "en");
//! ```

use parking_lot::Mutex;
use std::collections::BTreeSet;

/// The host's multilingual switcher.
pub trait LocaleSwitcher: Send + Sync {
    /// The locale currently in effect.
    fn current(&self) -> String;

    /// Whether `locale` can be switched to.
    fn supports(&self, locale: &str) -> bool;

    /// Make `locale` current.
    fn set(&self, locale: &str);
}

/// Restores the locale that was current when the guard was created.
#[must_use = "the previous locale is restored when the guard is dropped"]
pub struct LocaleGuard<'a> {
    switcher: &'a dyn LocaleSwitcher,
    previous: String,
}

impl<'a> LocaleGuard<'a> {
    /// Switch to `locale` until the guard is dropped.
    ///
    /// Unsupported locales leave the current one in place; the guard still
    /// restores on drop.
    pub fn switch(switcher: &'a dyn LocaleSwitcher, locale: &str) -> Self {
        let previous = switcher.current();
        if switcher.supports(locale) {
            if previous != locale {
                tracing::debug!(from = %previous, to = %locale, "Switching locale");
                switcher.set(locale);
            }
        } else {
            tracing::warn!(locale = %locale, "Unsupported locale, keeping current");
        }
        Self { switcher, previous }
    }

    /// The locale that will be restored.
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl Drop for LocaleGuard<'_> {
    fn drop(&mut self) {
        if self.switcher.current() != self.previous {
            self.switcher.set(&self.previous);
        }
    }
}

/// In-process locale setting.
#[derive(Debug)]
pub struct SharedLocale {
    current: Mutex<String>,
    supported: BTreeSet<String>,
}

impl SharedLocale {
    /// Create with `default` as the current (and only supported) locale.
    pub fn new(default: impl Into<String>) -> Self {
        let default = default.into();
        let mut supported = BTreeSet::new();
        supported.insert(default.clone());
        Self {
            current: Mutex::new(default),
            supported,
        }
    }

    /// Add supported locales.
    pub fn supported<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported.extend(locales.into_iter().map(Into::into));
        self
    }
}

impl LocaleSwitcher for SharedLocale {
    fn current(&self) -> String {
        self.current.lock().clone()
    }

    fn supports(&self, locale: &str) -> bool {
        self.supported.contains(locale)
    }

    fn set(&self, locale: &str) {
        *self.current.lock() = locale.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_on_drop() {
        let locale = SharedLocale::new("en").supported(["fr"]);
        let guard = LocaleGuard::switch(&locale, "fr");
        assert_eq!(locale.current(), "fr");
        assert_eq!(guard.previous(), "en");
        drop(guard);
        assert_eq!(locale.current(), "en");
    }

    #[test]
    fn test_unsupported_locale_is_ignored() {
        let locale = SharedLocale::new("en");
        let _guard = LocaleGuard::switch(&locale, "xx");
        assert_eq!(locale.current(), "en");
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        fn fails(locale: &SharedLocale) -> Result<(), &'static str> {
            let _guard = LocaleGuard::switch(locale, "de");
            Err("render failed")
        }

        let locale = SharedLocale::new("en").supported(["de"]);
        assert!(fails(&locale).is_err());
        assert_eq!(locale.current(), "en");
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let locale = SharedLocale::new("en").supported(["nl"]);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = LocaleGuard::switch(&locale, "nl");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(locale.current(), "en");
    }
}
