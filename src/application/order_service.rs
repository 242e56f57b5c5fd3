use super::locks::EntityLocks;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::domain::ports::OrderStoreBox;
use crate::error::{CommerceError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// A requested order line, before it becomes an [`OrderItem`].
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl From<NewOrderItem> for OrderItem {
    fn from(item: NewOrderItem) -> Self {
        OrderItem::new(item.product_id, item.name, item.unit_price, item.quantity)
    }
}

/// Order use cases: creation, lookup and guarded status changes.
pub struct OrderService {
    orders: OrderStoreBox,
    locks: EntityLocks,
}

impl OrderService {
    pub fn new(orders: OrderStoreBox) -> Self {
        Self {
            orders,
            locks: EntityLocks::new(),
        }
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_order(&self, customer_id: &str, items: Vec<NewOrderItem>) -> Result<Order> {
        if customer_id.trim().is_empty() {
            return Err(CommerceError::InvalidCustomerId);
        }

        let items = items.into_iter().map(OrderItem::from).collect();
        let order = Order::new(customer_id, items)?;

        self.orders
            .save(&order)
            .await
            .map_err(|e| CommerceError::store("save order", order.id(), e))?;

        info!(order_id = order.id(), total = %order.total_amount(), "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order> {
        if id.trim().is_empty() {
            return Err(CommerceError::InvalidOrderId);
        }
        self.orders
            .get(id)
            .await
            .map_err(|e| CommerceError::store("load order", id, e))?
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))
    }

    pub async fn get_customer_orders(&self, customer_id: &str) -> Result<Vec<Order>> {
        if customer_id.trim().is_empty() {
            return Err(CommerceError::InvalidCustomerId);
        }
        self.orders
            .find_by_customer(customer_id)
            .await
            .map_err(|e| CommerceError::store("list orders of customer", customer_id, e))
    }

    /// Reloads the order, applies the transition guard and writes it back.
    #[instrument(skip(self, id), fields(order_id = id))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        let _guard = self.locks.lock(id).await;
        let mut order = self.get_order(id).await?;
        let from = order.status();

        if let Err(e) = order.update_status(status) {
            warn!(%from, to = %status, "order status change refused");
            return Err(e);
        }

        self.orders
            .update(&order)
            .await
            .map_err(|e| CommerceError::store("update order", id, e))?;

        info!(%from, to = %status, "order status changed");
        Ok(order)
    }

    /// Same guard as any other status change: a delivered order cannot be canceled.
    pub async fn cancel_order(&self, id: &str) -> Result<Order> {
        self.update_status(id, OrderStatus::Canceled).await
    }

    /// Every stored order, for reporting.
    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        self.orders
            .all()
            .await
            .map_err(|e| CommerceError::store("list", "orders", e))
    }
}
