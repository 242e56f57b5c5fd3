use super::money::Money;
use crate::error::{CommerceError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// The transition table. `Delivered` and `Canceled` have no way out.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Paid)
                | (Pending, Canceled)
                | (Paid, Shipped)
                | (Paid, Canceled)
                | (Shipped, Delivered)
                | (Shipped, Canceled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{s}'"))
    }
}

/// A single order line. Owned by its `Order`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    id: String,
    product_id: String,
    name: String,
    unit_price: Money,
    quantity: u32,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            name: name.into(),
            unit_price: Money::new(unit_price),
            quantity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `None` if the line total does not fit in a `Decimal`.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    fn is_valid(&self) -> bool {
        self.quantity > 0 && self.unit_price >= Money::ZERO
    }
}

/// An order and its status lifecycle.
///
/// Items and total are fixed at creation. The only mutation is
/// [`Order::update_status`], which enforces the transition table of
/// [`OrderStatus::can_transition_to`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    id: String,
    customer_id: String,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order, computing its total from `items`.
    pub fn new(customer_id: impl Into<String>, items: Vec<OrderItem>) -> Result<Self> {
        if items.is_empty() || !items.iter().all(OrderItem::is_valid) {
            return Err(CommerceError::InvalidOrderItems);
        }

        let total_amount = items
            .iter()
            .try_fold(Money::ZERO, |total, item| {
                item.subtotal().and_then(|subtotal| total.checked_add(subtotal))
            })
            .filter(Money::is_positive)
            .ok_or(CommerceError::InvalidOrderAmount)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            items,
            total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the order to `to` if the transition table allows it.
    ///
    /// On failure the order is left untouched, including `updated_at`.
    pub fn update_status(&mut self, to: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(CommerceError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
