//! Email templates and the store's active template set.
//!
//! An [`EmailTemplate`] is one configured transactional email. It renders
//! itself against a [`RenderContext`] that borrows an order for the duration
//! of a single render; nothing about the binding outlives the call.
//!
//! The built-in [`OrderEmail`] renders the store's core order emails with
//! Askama templates (`templates/emails/order.html` and `order.txt`).
//!
//! # Custom templates
//!
//! ```rust,ignore
//! use mailproof::{EmailTemplate, RenderContext, PreviewError, TemplateId, TemplateSet};
//!
//! struct RenewalReminder { id: TemplateId }
//!
//! impl EmailTemplate for RenewalReminder {
//!     fn id(&self) -> &TemplateId { &self.id }
//!     fn key(&self) -> &str { "renewal_reminder" }
//!     fn title(&self) -> &str { "Renewal reminder" }
//!
//!     fn render_html(&self, ctx: &RenderContext<'_>) -> Result<String, PreviewError> {
//!         Ok(format!("<p>Order {} renews soon</p>", ctx.order.number))
//!     }
//! }
//!
//! let mut templates = TemplateSet::with_defaults();
//! templates.register(RenewalReminder { id: "WCS_Email_Renewal_Reminder".into() });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use askama::Template;
use serde::Serialize;

use crate::error::PreviewError;
use crate::order::Order;
use crate::registry::TemplateId;

/// Declared body format of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Plain,
    Multipart,
}

impl ContentType {
    /// Whether the rendered body is HTML markup.
    pub fn is_html(&self) -> bool {
        !matches!(self, Self::Plain)
    }

    /// MIME type of the preview response.
    pub fn mime(&self) -> &'static str {
        if self.is_html() {
            "text/html; charset=utf-8"
        } else {
            "text/plain; charset=utf-8"
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "HTML",
            Self::Plain => "Plain text",
            Self::Multipart => "Multipart",
        })
    }
}

/// A rendered email body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub body: String,
    pub content_type: ContentType,
}

impl RenderedContent {
    pub fn new(body: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

/// What a template renders against.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub order: &'a Order,
    /// Locale in effect for this render.
    pub locale: &'a str,
    pub site_title: &'a str,
}

/// A configured transactional email.
pub trait EmailTemplate: Send + Sync {
    /// Identifier the registry resolves to.
    fn id(&self) -> &TemplateId;

    /// Short key used in preview links and the settings table.
    fn key(&self) -> &str;

    /// Human-readable name.
    fn title(&self) -> &str;

    /// Who receives this email.
    fn recipient(&self) -> &str {
        "Customer"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Html
    }

    /// Render the HTML body.
    fn render_html(&self, ctx: &RenderContext<'_>) -> Result<String, PreviewError>;

    /// Render the plain-text body.
    ///
    /// Override in templates that support plain-text delivery.
    fn render_plain(&self, ctx: &RenderContext<'_>) -> Result<String, PreviewError> {
        self.render_html(ctx)
    }

    /// Render the body matching the declared content type.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<RenderedContent, PreviewError> {
        let content_type = self.content_type();
        let body = if content_type.is_html() {
            self.render_html(ctx)?
        } else {
            self.render_plain(ctx)?
        };
        Ok(RenderedContent::new(body, content_type))
    }
}

// ============================================================================
// Built-in order emails
// ============================================================================

/// One of the store's core order emails.
#[derive(Debug, Clone)]
pub struct OrderEmail {
    id: TemplateId,
    key: String,
    title: String,
    recipient: String,
    subject: String,
    heading: String,
    intro: String,
    footer: String,
    content_type: ContentType,
    show_order: bool,
    show_note: bool,
}

impl OrderEmail {
    /// Create a customer-facing HTML email.
    pub fn new(id: impl Into<TemplateId>, key: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            key: key.into(),
            subject: title.clone(),
            heading: title.clone(),
            title,
            recipient: "Customer".to_string(),
            intro: String::new(),
            footer: "{site_title}".to_string(),
            content_type: ContentType::Html,
            show_order: true,
            show_note: false,
        }
    }

    /// Send to the store admin instead of the customer.
    pub fn admin(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Leave out the order table (account emails).
    pub fn without_order_details(mut self) -> Self {
        self.show_order = false;
        self
    }

    /// Quote the order's customer note above the details.
    pub fn with_customer_note(mut self) -> Self {
        self.show_note = true;
        self
    }

    fn fill(&self, text: &str, ctx: &RenderContext<'_>) -> String {
        text.replace("{site_title}", ctx.site_title)
            .replace("{order_number}", &ctx.order.number)
            .replace("{order_date}", &format_date(ctx.order))
            .replace("{customer_name}", &ctx.order.billing.full_name())
            .replace("{customer_email}", &ctx.order.billing.email)
    }

    fn summary(&self, order: &Order) -> Option<OrderSummary> {
        if !self.show_order {
            return None;
        }

        Some(OrderSummary {
            number: order.number.clone(),
            date: format_date(order),
            status: order.status.label(),
            items: order
                .items
                .iter()
                .map(|item| ItemRow {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    total: item.total.format(&order.currency),
                })
                .collect(),
            subtotal: order.subtotal().format(&order.currency),
            shipping: order.shipping_total.format(&order.currency),
            total: order.total().format(&order.currency),
            payment_method: order.payment_method.clone(),
            billing_name: order.billing.full_name(),
            billing_email: order.billing.email.clone(),
            billing_phone: order.billing.phone.clone(),
            address_lines: order.billing.address_lines.clone(),
        })
    }

    fn note<'a>(&self, order: &'a Order) -> Option<&'a str> {
        if self.show_note {
            order.customer_note.as_deref()
        } else {
            None
        }
    }
}

impl EmailTemplate for OrderEmail {
    fn id(&self) -> &TemplateId {
        &self.id
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn recipient(&self) -> &str {
        &self.recipient
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn render_html(&self, ctx: &RenderContext<'_>) -> Result<String, PreviewError> {
        let subject = self.fill(&self.subject, ctx);
        let heading = self.fill(&self.heading, ctx);
        let intro = self.fill(&self.intro, ctx);
        let footer = self.fill(&self.footer, ctx);

        let page = OrderEmailHtml {
            lang: ctx.locale,
            subject: &subject,
            heading: &heading,
            intro: &intro,
            note: self.note(ctx.order),
            order: self.summary(ctx.order),
            footer: &footer,
        };
        Ok(page.render()?)
    }

    fn render_plain(&self, ctx: &RenderContext<'_>) -> Result<String, PreviewError> {
        let heading = self.fill(&self.heading, ctx);
        let intro = self.fill(&self.intro, ctx);
        let footer = self.fill(&self.footer, ctx);

        let text = OrderEmailText {
            heading: &heading,
            intro: &intro,
            note: self.note(ctx.order),
            order: self.summary(ctx.order),
            footer: &footer,
        };
        Ok(text.render()?)
    }
}

fn format_date(order: &Order) -> String {
    order.created_at.format("%B %-d, %Y").to_string()
}

struct ItemRow {
    name: String,
    quantity: u32,
    total: String,
}

struct OrderSummary {
    number: String,
    date: String,
    status: &'static str,
    items: Vec<ItemRow>,
    subtotal: String,
    shipping: String,
    total: String,
    payment_method: Option<String>,
    billing_name: String,
    billing_email: String,
    billing_phone: Option<String>,
    address_lines: Vec<String>,
}

#[derive(Template)]
#[template(path = "emails/order.html")]
struct OrderEmailHtml<'a> {
    lang: &'a str,
    subject: &'a str,
    heading: &'a str,
    intro: &'a str,
    note: Option<&'a str>,
    order: Option<OrderSummary>,
    footer: &'a str,
}

#[derive(Template)]
#[template(path = "emails/order.txt")]
struct OrderEmailText<'a> {
    heading: &'a str,
    intro: &'a str,
    note: Option<&'a str>,
    order: Option<OrderSummary>,
    footer: &'a str,
}

/// The core emails every store ships with.
fn default_templates() -> Vec<OrderEmail> {
    const ADMIN: &str = "Store admin";

    vec![
        OrderEmail::new("WC_Email_New_Order", "new_order", "New order")
            .admin(ADMIN)
            .subject("[{site_title}]: New order #{order_number}")
            .heading("New Order: #{order_number}")
            .intro("You've received the following order from {customer_name}:"),
        OrderEmail::new("WC_Email_Cancelled_Order", "cancelled_order", "Cancelled order")
            .admin(ADMIN)
            .subject("[{site_title}]: Order #{order_number} has been cancelled")
            .heading("Order Cancelled: #{order_number}")
            .intro("Order #{order_number} belonging to {customer_name} has been cancelled:"),
        OrderEmail::new("WC_Email_Failed_Order", "failed_order", "Failed order")
            .admin(ADMIN)
            .subject("[{site_title}]: Order #{order_number} has failed")
            .heading("Order Failed: #{order_number}")
            .intro("Payment for order #{order_number} from {customer_name} has failed. The order was as follows:"),
        OrderEmail::new("WC_Email_Customer_Failed_Order", "customer_failed_order", "Failed order")
            .subject("Your {site_title} order was unsuccessful")
            .heading("Sorry, your order was unsuccessful")
            .intro("Unfortunately, we couldn't complete your order due to an issue with your payment method."),
        OrderEmail::new("WC_Email_Customer_On_Hold_Order", "customer_on_hold_order", "Order on-hold")
            .subject("Your {site_title} order has been received!")
            .heading("Thank you for your order")
            .intro("Thanks for your order. It's on-hold until we confirm that payment has been received."),
        OrderEmail::new("WC_Email_Customer_Processing_Order", "customer_processing_order", "Processing order")
            .subject("Your {site_title} order has been received!")
            .heading("Thank you for your order")
            .intro("Just to let you know, we've received your order #{order_number}, and it is now being processed:"),
        OrderEmail::new("WC_Email_Customer_Completed_Order", "customer_completed_order", "Completed order")
            .subject("Your {site_title} order is now complete")
            .heading("Thanks for shopping with us")
            .intro("We have finished processing your order."),
        OrderEmail::new("WC_Email_Customer_Refunded_Order", "customer_refunded_order", "Refunded order")
            .subject("Your {site_title} order #{order_number} has been refunded")
            .heading("Order Refunded: {order_number}")
            .intro("Your order on {site_title} has been refunded."),
        OrderEmail::new("WC_Email_Customer_Invoice", "customer_invoice", "Customer invoice / Order details")
            .subject("Invoice for order #{order_number} on {site_title}")
            .heading("Invoice for order #{order_number}")
            .intro("Here are the details of your order placed on {order_date}:"),
        OrderEmail::new("WC_Email_Customer_Note", "customer_note", "Customer note")
            .subject("Note added to your {site_title} order from {order_date}")
            .heading("A note has been added to your order")
            .intro("The following note has been added to your order:")
            .with_customer_note(),
        OrderEmail::new("WC_Email_Customer_Reset_Password", "customer_reset_password", "Reset password")
            .subject("Password Reset Request for {site_title}")
            .heading("Password Reset Request")
            .intro("Someone has requested a new password for the account registered to {customer_email} on {site_title}.")
            .without_order_details(),
        OrderEmail::new("WC_Email_Customer_New_Account", "customer_new_account", "New account")
            .subject("Your {site_title} account has been created!")
            .heading("Welcome to {site_title}")
            .intro("Thanks for creating an account on {site_title}. Your username is {customer_email}.")
            .without_order_details(),
    ]
}

// ============================================================================
// Template set
// ============================================================================

/// The store's active templates, keyed by id, in registration order.
#[derive(Default)]
pub struct TemplateSet {
    templates: HashMap<TemplateId, Arc<dyn EmailTemplate>>,
    order: Vec<TemplateId>,
}

impl TemplateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding the core order emails.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        for template in default_templates() {
            set.register(template);
        }
        set
    }

    /// Activate a template, replacing any with the same id.
    pub fn register<T: EmailTemplate + 'static>(&mut self, template: T) -> &mut Self {
        self.register_arc(Arc::new(template))
    }

    /// Activate a shared template.
    pub fn register_arc(&mut self, template: Arc<dyn EmailTemplate>) -> &mut Self {
        let id = template.id().clone();
        if self.templates.insert(id.clone(), template).is_none() {
            self.order.push(id);
        }
        self
    }

    /// Get an active template.
    pub fn get(&self, id: &TemplateId) -> Option<Arc<dyn EmailTemplate>> {
        self.templates.get(id).cloned()
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.templates.contains_key(id)
    }

    /// All active templates in registration order.
    pub fn all(&self) -> Vec<Arc<dyn EmailTemplate>> {
        self.order
            .iter()
            .filter_map(|id| self.templates.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.order)
            .finish()
    }
}
