//! Orders as seen by the preview: read-only records fetched from the store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending payment",
            Self::Processing => "Processing",
            Self::OnHold => "On hold",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Failed => "Failed",
        }
    }
}

/// Amount in minor units (cents) of the order currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    /// Format with the currency symbol, e.g. `€12.50` or `12.50 CHF`.
    pub fn format(&self, currency: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let amount = format!("{}.{:02}", abs / 100, abs % 100);
        match currency_symbol(currency) {
            Some(symbol) => format!("{}{}{}", sign, symbol, amount),
            None => format!("{}{} {}", sign, amount, currency),
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money(0), |acc, m| acc + m)
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "EUR" => Some("€"),
        "USD" | "CAD" | "AUD" => Some("$"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

/// One purchased product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    /// Line total (unit price × quantity).
    pub total: Money,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, total: Money) -> Self {
        Self {
            name: name.into(),
            quantity,
            total,
        }
    }
}

/// Billing contact of the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_lines: Vec<String>,
}

impl BillingDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A store order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub number: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub currency: String,
    pub billing: BillingDetails,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_total: Money,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer_note: Option<String>,
}

impl Order {
    /// Create an order whose number equals its id.
    pub fn new(id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            number: id.to_string(),
            status: OrderStatus::Processing,
            created_at,
            currency: "USD".to_string(),
            billing: BillingDetails::default(),
            items: Vec::new(),
            shipping_total: Money(0),
            payment_method: None,
            customer_note: None,
        }
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn billing(mut self, billing: BillingDetails) -> Self {
        self.billing = billing;
        self
    }

    pub fn item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn shipping(mut self, shipping: Money) -> Self {
        self.shipping_total = shipping;
        self
    }

    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn customer_note(mut self, note: impl Into<String>) -> Self {
        self.customer_note = Some(note.into());
        self
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.total).sum()
    }

    pub fn total(&self) -> Money {
        self.subtotal() + self.shipping_total
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number)
    }
}

/// Read access to the store's orders.
///
/// The preview never writes through this trait.
pub trait OrderStore: Send + Sync {
    /// Get an order by id.
    fn get(&self, id: u64) -> Option<Order>;

    /// The most recently created order, used as preview data.
    fn latest(&self) -> Option<Order>;
}

/// Thread-safe in-memory order store.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<u64, Order>>,
    /// Insertion order of ids, for breaking `created_at` ties.
    order: RwLock<Vec<u64>>,
}

impl MemoryOrderStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store wrapped in an Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace an order.
    pub fn insert(&self, order: Order) {
        let mut orders = self.orders.write();
        let mut ids = self.order.write();
        if orders.insert(order.id, order.clone()).is_none() {
            ids.push(order.id);
        }
    }

    pub fn count(&self) -> usize {
        self.orders.read().len()
    }
}

impl OrderStore for MemoryOrderStore {
    fn get(&self, id: u64) -> Option<Order> {
        self.orders.read().get(&id).cloned()
    }

    fn latest(&self) -> Option<Order> {
        let orders = self.orders.read();
        let ids = self.order.read();

        // max_by_key keeps the last maximum, so later inserts win ties
        ids.iter()
            .filter_map(|id| orders.get(id))
            .max_by_key(|o| o.created_at)
            .cloned()
    }
}

impl<S: OrderStore + ?Sized> OrderStore for Arc<S> {
    fn get(&self, id: u64) -> Option<Order> {
        (**self).get(id)
    }

    fn latest(&self) -> Option<Order> {
        (**self).latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_totals() {
        let order = Order::new(1, at(1))
            .item(LineItem::new("Mug", 2, Money(1800)))
            .item(LineItem::new("Poster", 1, Money(1250)))
            .shipping(Money(495));

        assert_eq!(order.subtotal(), Money(3050));
        assert_eq!(order.total(), Money(3545));
        assert_eq!(order.to_string(), "#1");
    }

    #[test]
    fn test_money_format() {
        assert_eq!(Money(3545).format("USD"), "$35.45");
        assert_eq!(Money(5).format("EUR"), "€0.05");
        assert_eq!(Money(-1200).format("GBP"), "-£12.00");
        assert_eq!(Money(100000).format("CHF"), "1000.00 CHF");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryOrderStore::new();
        assert!(store.latest().is_none());

        store.insert(Order::new(7, at(2)));
        store.insert(Order::new(3, at(5)));
        store.insert(Order::new(9, at(4)));

        assert_eq!(store.count(), 3);
        assert_eq!(store.get(9).unwrap().id, 9);
        assert!(store.get(10).is_none());

        // Most recently created, not most recently inserted
        assert_eq!(store.latest().unwrap().id, 3);
    }

    #[test]
    fn test_latest_ties_prefer_later_insert() {
        let store = MemoryOrderStore::new();
        store.insert(Order::new(1, at(3)));
        store.insert(Order::new(2, at(3)));
        assert_eq!(store.latest().unwrap().id, 2);
    }

    #[test]
    fn test_replace_keeps_single_entry() {
        let store = MemoryOrderStore::new();
        store.insert(Order::new(1, at(3)));
        store.insert(Order::new(1, at(3)).status(OrderStatus::Completed));
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(1).unwrap().status, OrderStatus::Completed);
    }
}
