use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Delivery,
    Pickup,
    DineIn,
}

/// Payment method bucket derived from the free-text field on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Other,
}

impl PaymentMethod {
    /// Buckets free text by case-insensitive substring matching.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("efectivo") || lowered.contains("cash") {
            Self::Cash
        } else if lowered.contains("transfer") {
            Self::Transfer
        } else {
            Self::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Efectivo",
            Self::Transfer => "Transferencia",
            Self::Other => "Otro",
        }
    }
}

/// A modifier selected on an order line (extra cheese, no onion...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    #[serde(default)]
    pub additional_price: f64,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub subtotal: f64,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl OrderItem {
    pub fn new(product_name: impl Into<String>, quantity: u32, subtotal: f64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            subtotal,
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, name: impl Into<String>, additional_price: f64) -> Self {
        self.modifiers.push(Modifier {
            name: name.into(),
            additional_price,
        });
        self
    }
}

/// Table and zone for dine-in orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub table_name: String,
    #[serde(default)]
    pub zone_name: Option<String>,
}

/// Represents a customer order as the hosted backend returns it.
///
/// `total` is expected to equal `subtotal + shipping_cost + tip`; it is
/// computed upstream and never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: u64,
    pub status: OrderStatus,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub tip: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub table: Option<TableRef>,
    #[serde(default, rename = "order_items")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a pickup order with no items and no timestamp.
    pub fn new(
        id: impl Into<String>,
        order_number: u64,
        customer_name: impl Into<String>,
        status: OrderStatus,
    ) -> Self {
        Self {
            id: id.into(),
            order_number,
            status,
            customer_name: customer_name.into(),
            customer_phone: None,
            delivery_type: DeliveryType::Pickup,
            delivery_address: None,
            delivery_notes: None,
            payment_method: None,
            subtotal: 0.0,
            shipping_cost: 0.0,
            tip: 0.0,
            total: 0.0,
            created_at: None,
            table: None,
            items: Vec::new(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn for_delivery(mut self, address: impl Into<String>, shipping_cost: f64) -> Self {
        self.delivery_type = DeliveryType::Delivery;
        self.delivery_address = Some(address.into());
        self.shipping_cost = shipping_cost;
        self.total = self.subtotal + self.shipping_cost + self.tip;
        self
    }

    /// Appends a line and keeps `subtotal` and `total` consistent.
    pub fn with_item(mut self, item: OrderItem) -> Self {
        let line_total =
            item.subtotal + item.modifiers.iter().map(|m| m.additional_price).sum::<f64>();
        self.subtotal += line_total;
        self.total = self.subtotal + self.shipping_cost + self.tip;
        self.items.push(item);
        self
    }

    /// Number of dishes on the order, i.e. the sum of line quantities.
    pub fn dish_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn payment_kind(&self) -> PaymentMethod {
        self.payment_method
            .as_deref()
            .map(PaymentMethod::normalize)
            .unwrap_or(PaymentMethod::Other)
    }

    /// Short one-line description used by toasts and notifications.
    pub fn summary(&self) -> String {
        let dishes = self.dish_count();
        let noun = if dishes == 1 { "plato" } else { "platos" };
        format!(
            "#{} · {} · {} {} · ${:.2}",
            self.order_number, self.customer_name, dishes, noun, self.total
        )
    }
}
