use crate::domain::member::Member;
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::domain::ports::{MemberStore, OrderStore, PaymentGateway, PaymentStore, StoreResult};
use crate::error::{GatewayError, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<String, Order>>>`; clones share the same map, so a
/// test can keep a handle while the service owns a boxed copy.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(order.id()) {
            return Err(StoreError::Duplicate(order.id().to_string()));
        }
        orders.insert(order.id().to_string(), order.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).cloned())
    }

    async fn find_by_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect();
        found.sort_by_key(Order::created_at);
        Ok(found)
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(order.id()) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(order.id().to_string())),
        }
    }

    async fn all(&self) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(Order::created_at);
        Ok(all)
    }
}

/// A thread-safe in-memory store for payments.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<String, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn save(&self, payment: &Payment) -> StoreResult<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(payment.id()) {
            return Err(StoreError::Duplicate(payment.id().to_string()));
        }
        payments.insert(payment.id().to_string(), payment.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(id).cloned())
    }

    async fn find_by_order(&self, order_id: &str) -> StoreResult<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|payment| payment.order_id() == order_id)
            .cloned())
    }

    async fn update(&self, payment: &Payment) -> StoreResult<()> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(payment.id()) {
            Some(slot) => {
                *slot = payment.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(payment.id().to_string())),
        }
    }

    async fn all(&self) -> StoreResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut all: Vec<Payment> = payments.values().cloned().collect();
        all.sort_by_key(Payment::created_at);
        Ok(all)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMemberStore {
    members: Arc<RwLock<HashMap<String, Member>>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn save(&self, member: &Member) -> StoreResult<()> {
        let mut members = self.members.write().await;
        if members.contains_key(member.id()) {
            return Err(StoreError::Duplicate(member.id().to_string()));
        }
        members.insert(member.id().to_string(), member.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.values().find(|m| m.email() == email).cloned())
    }

    async fn update(&self, member: &Member) -> StoreResult<()> {
        let mut members = self.members.write().await;
        match members.get_mut(member.id()) {
            Some(slot) => {
                *slot = member.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(member.id().to_string())),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut members = self.members.write().await;
        members
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[derive(Default)]
struct Script {
    charges: VecDeque<Result<String, GatewayError>>,
    refunds: VecDeque<Result<(), GatewayError>>,
    charge_calls: usize,
    refund_calls: usize,
}

/// An in-memory stand-in for the payment gateway.
///
/// Replays queued outcomes in order. With nothing queued a charge succeeds
/// with `txn_<payment id>` and a refund succeeds. Counts every call.
#[derive(Default, Clone)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_charge(&self, outcome: Result<String, GatewayError>) {
        self.script.lock().await.charges.push_back(outcome);
    }

    pub async fn push_refund(&self, outcome: Result<(), GatewayError>) {
        self.script.lock().await.refunds.push_back(outcome);
    }

    pub async fn charge_calls(&self) -> usize {
        self.script.lock().await.charge_calls
    }

    pub async fn refund_calls(&self) -> usize {
        self.script.lock().await.refund_calls
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn process_payment(&self, payment: &Payment) -> Result<String, GatewayError> {
        let mut script = self.script.lock().await;
        script.charge_calls += 1;
        script
            .charges
            .pop_front()
            .unwrap_or_else(|| Ok(format!("txn_{}", payment.id())))
    }

    async fn refund_payment(&self, _payment: &Payment, _reason: &str) -> Result<(), GatewayError> {
        let mut script = self.script.lock().await;
        script.refund_calls += 1;
        script.refunds.pop_front().unwrap_or(Ok(()))
    }
}
