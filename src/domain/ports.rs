use super::member::Member;
use super::order::Order;
use super::payment::Payment;
use crate::error::{GatewayError, StoreError};
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for orders.
///
/// `save` fails with `StoreError::Duplicate` for a known id, `update` with
/// `StoreError::NotFound` for an unknown one.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn save(&self, order: &Order) -> StoreResult<()>;
    async fn get(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn find_by_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>>;
    async fn update(&self, order: &Order) -> StoreResult<()>;
    async fn all(&self) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn save(&self, payment: &Payment) -> StoreResult<()>;
    async fn get(&self, id: &str) -> StoreResult<Option<Payment>>;
    async fn find_by_order(&self, order_id: &str) -> StoreResult<Option<Payment>>;
    async fn update(&self, payment: &Payment) -> StoreResult<()>;
    async fn all(&self) -> StoreResult<Vec<Payment>>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn save(&self, member: &Member) -> StoreResult<()>;
    async fn get(&self, id: &str) -> StoreResult<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Member>>;
    async fn update(&self, member: &Member) -> StoreResult<()>;
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// The external payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the payment, returning the processor's transaction reference.
    async fn process_payment(&self, payment: &Payment) -> Result<String, GatewayError>;
    async fn refund_payment(&self, payment: &Payment, reason: &str) -> Result<(), GatewayError>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type MemberStoreBox = Box<dyn MemberStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
