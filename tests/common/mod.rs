#![allow(dead_code)]

use async_trait::async_trait;
use commerce_core::application::order_service::NewOrderItem;
use commerce_core::domain::payment::Payment;
use commerce_core::domain::ports::{PaymentGateway, PaymentStore, StoreResult};
use commerce_core::error::{GatewayError, StoreError};
use commerce_core::infrastructure::in_memory::InMemoryPaymentStore;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

pub fn item(product: &str, unit_price: Decimal, quantity: u32) -> NewOrderItem {
    NewOrderItem {
        product_id: product.to_string(),
        name: product.to_uppercase(),
        unit_price,
        quantity,
    }
}

/// Writes `lines` to a temporary JSON-lines script.
pub fn script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[derive(Default)]
struct Counters {
    saves: AtomicUsize,
    finds: AtomicUsize,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
}

/// Wraps the in-memory payment store, counting calls and optionally failing
/// every `update`.
#[derive(Clone, Default)]
pub struct ProbedPaymentStore {
    inner: InMemoryPaymentStore,
    counters: Arc<Counters>,
}

impl ProbedPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.counters.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.counters.saves.load(Ordering::SeqCst)
            + self.counters.finds.load(Ordering::SeqCst)
            + self.counters.updates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.counters.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStore for ProbedPaymentStore {
    async fn save(&self, payment: &Payment) -> StoreResult<()> {
        self.counters.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(payment).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Payment>> {
        self.counters.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn find_by_order(&self, order_id: &str) -> StoreResult<Option<Payment>> {
        self.counters.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_order(order_id).await
    }

    async fn update(&self, payment: &Payment) -> StoreResult<()> {
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.update(payment).await
    }

    async fn all(&self) -> StoreResult<Vec<Payment>> {
        self.inner.all().await
    }
}

/// A gateway that takes a while to answer, widening any race between
/// concurrent callers.
#[derive(Clone, Default)]
pub struct SlowGateway {
    charges: Arc<AtomicUsize>,
}

impl SlowGateway {
    pub fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SlowGateway {
    async fn process_payment(&self, payment: &Payment) -> Result<String, GatewayError> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(format!("txn_{}", payment.id()))
    }

    async fn refund_payment(&self, _payment: &Payment, _reason: &str) -> Result<(), GatewayError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }
}
