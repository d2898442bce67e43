//! Email type registry.
//!
//! Maps the short keys used in preview links (`new_order`, `customer_invoice`)
//! to the identifiers of the store's email templates.
//!
//! # Example
//!
//! ```rust
//! use mailproof::{EmailTypeRegistry, TemplateId};
//!
//! let mut registry = EmailTypeRegistry::with_defaults();
//! registry.register("gift_card", "Acme_Email_Gift_Card");
//!
//! assert_eq!(
//!     registry.resolve("gift_card"),
//!     Some(&TemplateId::new("Acme_Email_Gift_Card"))
//! );
//! assert!(registry.resolve("Gift_Card").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Identifier of an email template in the host store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TemplateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Built-in key table. Subscription emails (`WCS_*`) only resolve to an
/// active template when a collaborator registers one.
pub const DEFAULT_EMAIL_TYPES: &[(&str, &str)] = &[
    ("cancelled_order", "WC_Email_Cancelled_Order"),
    ("cancelled_subscription", "WCS_Email_Cancelled_Subscription"),
    ("customer_completed_order", "WC_Email_Customer_Completed_Order"),
    ("customer_completed_renewal_order", "WCS_Email_Completed_Renewal_Order"),
    ("customer_completed_switch_order", "WCS_Email_Completed_Switch_Order"),
    ("customer_invoice", "WC_Email_Customer_Invoice"),
    ("customer_failed_order", "WC_Email_Customer_Failed_Order"),
    ("customer_new_account", "WC_Email_Customer_New_Account"),
    ("customer_note", "WC_Email_Customer_Note"),
    ("customer_on_hold_order", "WC_Email_Customer_On_Hold_Order"),
    ("customer_payment_retry", "WCS_Email_Customer_Payment_Retry"),
    ("customer_processing_order", "WC_Email_Customer_Processing_Order"),
    ("customer_processing_renewal_order", "WCS_Email_Processing_Renewal_Order"),
    ("customer_refunded_order", "WC_Email_Customer_Refunded_Order"),
    ("customer_renewal_invoice", "WCS_Email_Customer_Renewal_Invoice"),
    ("customer_reset_password", "WC_Email_Customer_Reset_Password"),
    ("expired_subscription", "WCS_Email_Expired_Subscription"),
    ("failed_order", "WC_Email_Failed_Order"),
    ("new_order", "WC_Email_New_Order"),
    ("new_renewal_order", "WCS_Email_New_Renewal_Order"),
    ("new_switch_order", "WCS_Email_New_Switch_Order"),
    ("payment_retry", "WCS_Email_Payment_Retry"),
    ("suspended_subscription", "WCS_Email_On_Hold_Subscription"),
];

/// Key → template id mapping.
///
/// Lookups are exact and case-sensitive. Registering a key that already
/// exists replaces the previous entry: the last registration wins.
#[derive(Debug, Clone, Default)]
pub struct EmailTypeRegistry {
    entries: HashMap<String, TemplateId>,
}

impl EmailTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in email types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.extend(DEFAULT_EMAIL_TYPES.iter().copied());
        registry
    }

    /// Add or override an entry.
    ///
    /// Returns the id previously registered for `key`, if any.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        id: impl Into<TemplateId>,
    ) -> Option<TemplateId> {
        self.entries.insert(key.into(), id.into())
    }

    /// Register several entries in iteration order.
    pub fn extend<K, I>(&mut self, entries: impl IntoIterator<Item = (K, I)>)
    where
        K: Into<String>,
        I: Into<TemplateId>,
    {
        for (key, id) in entries {
            self.register(key, id);
        }
    }

    /// Let a collaborator add or override entries.
    pub fn apply<E: RegistryExtension + ?Sized>(&mut self, extension: &E) -> &mut Self {
        extension.extend_registry(self);
        self
    }

    /// Resolve a key. `None` means the type is not recognized.
    pub fn resolve(&self, key: &str) -> Option<&TemplateId> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Sorted `(key, id)` pairs.
    pub fn entries(&self) -> Vec<(&str, &TemplateId)> {
        let mut entries: Vec<(&str, &TemplateId)> =
            self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A collaborator that contributes registry entries.
///
/// For simple cases, use a closure:
///
/// ```rust
/// use mailproof::EmailTypeRegistry;
///
/// let mut registry = EmailTypeRegistry::with_defaults();
/// registry.apply(&|r: &mut EmailTypeRegistry| {
///     r.register("back_in_stock", "Acme_Email_Back_In_Stock");
/// });
/// assert!(registry.contains("back_in_stock"));
/// ```
pub trait RegistryExtension: Send + Sync {
    fn extend_registry(&self, registry: &mut EmailTypeRegistry);
}

impl<F> RegistryExtension for F
where
    F: Fn(&mut EmailTypeRegistry) + Send + Sync,
{
    fn extend_registry(&self, registry: &mut EmailTypeRegistry) {
        (self)(registry)
    }
}
