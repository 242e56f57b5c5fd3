use crate::domain::member::Member;
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::domain::ports::{MemberStore, OrderStore, PaymentStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

pub const CF_ORDERS: &str = "orders";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_MEMBERS: &str = "members";
/// `customer_id \0 order_id` -> empty
pub const CF_ORDERS_BY_CUSTOMER: &str = "orders_by_customer";
/// `order_id` -> payment id
pub const CF_PAYMENTS_BY_ORDER: &str = "payments_by_order";
/// `email` -> member id
pub const CF_MEMBERS_BY_EMAIL: &str = "members_by_email";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_ORDERS,
    CF_PAYMENTS,
    CF_MEMBERS,
    CF_ORDERS_BY_CUSTOMER,
    CF_PAYMENTS_BY_ORDER,
    CF_MEMBERS_BY_EMAIL,
];

/// A persistent store implementation using RocksDB.
///
/// Each entity kind lives in its own column family as JSON, keyed by id.
/// Secondary lookups go through index column families that are written in
/// the same `WriteBatch` as the entity.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating any missing
    /// column families.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(StoreError::backend)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::backend(format!("column family '{name}' not found")))
    }

    fn exists(&self, cf_name: &str, key: &str) -> StoreResult<bool> {
        let cf = self.cf(cf_name)?;
        let found = self.db.get_pinned_cf(cf, key).map_err(StoreError::backend)?;
        Ok(found.is_some())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> StoreResult<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key).map_err(StoreError::backend)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(StoreError::backend),
            None => Ok(None),
        }
    }

    fn get_string(&self, cf_name: &str, key: &str) -> StoreResult<Option<String>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key).map_err(StoreError::backend)? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(StoreError::backend),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &str,
        value: &T,
    ) -> StoreResult<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(StoreError::backend)?;
        batch.put_cf(cf, key, bytes);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> StoreResult<()> {
        self.db.write(batch).map_err(StoreError::backend)
    }

    fn all_json<T: DeserializeOwned>(&self, cf_name: &str) -> StoreResult<Vec<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| {
                let (_key, value) = item.map_err(StoreError::backend)?;
                serde_json::from_slice(&value).map_err(StoreError::backend)
            })
            .collect()
    }

    /// Keys of `cf_name` starting with `prefix`, with the prefix stripped.
    fn suffixes_with_prefix(&self, cf_name: &str, prefix: &[u8]) -> StoreResult<Vec<String>> {
        let cf = self.cf(cf_name)?;
        let mut suffixes = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, _value) = item.map_err(StoreError::backend)?;
            let Some(suffix) = key.strip_prefix(prefix) else {
                break;
            };
            suffixes.push(String::from_utf8(suffix.to_vec()).map_err(StoreError::backend)?);
        }
        Ok(suffixes)
    }
}

fn customer_key(customer_id: &str, order_id: &str) -> Vec<u8> {
    let mut key = customer_prefix(customer_id);
    key.extend_from_slice(order_id.as_bytes());
    key
}

fn customer_prefix(customer_id: &str) -> Vec<u8> {
    let mut prefix = customer_id.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn save(&self, order: &Order) -> StoreResult<()> {
        if self.exists(CF_ORDERS, order.id())? {
            return Err(StoreError::Duplicate(order.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_ORDERS, order.id(), order)?;
        batch.put_cf(
            self.cf(CF_ORDERS_BY_CUSTOMER)?,
            customer_key(order.customer_id(), order.id()),
            b"",
        );
        self.write(batch)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Order>> {
        self.get_json(CF_ORDERS, id)
    }

    async fn find_by_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders = Vec::new();
        for order_id in
            self.suffixes_with_prefix(CF_ORDERS_BY_CUSTOMER, &customer_prefix(customer_id))?
        {
            if let Some(order) = self.get_json::<Order>(CF_ORDERS, &order_id)? {
                orders.push(order);
            }
        }
        orders.sort_by_key(Order::created_at);
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        if !self.exists(CF_ORDERS, order.id())? {
            return Err(StoreError::NotFound(order.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_ORDERS, order.id(), order)?;
        self.write(batch)
    }

    async fn all(&self) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.all_json(CF_ORDERS)?;
        orders.sort_by_key(Order::created_at);
        Ok(orders)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn save(&self, payment: &Payment) -> StoreResult<()> {
        if self.exists(CF_PAYMENTS, payment.id())? {
            return Err(StoreError::Duplicate(payment.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_PAYMENTS, payment.id(), payment)?;
        batch.put_cf(
            self.cf(CF_PAYMENTS_BY_ORDER)?,
            payment.order_id(),
            payment.id(),
        );
        self.write(batch)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Payment>> {
        self.get_json(CF_PAYMENTS, id)
    }

    async fn find_by_order(&self, order_id: &str) -> StoreResult<Option<Payment>> {
        match self.get_string(CF_PAYMENTS_BY_ORDER, order_id)? {
            Some(payment_id) => self.get_json(CF_PAYMENTS, &payment_id),
            None => Ok(None),
        }
    }

    async fn update(&self, payment: &Payment) -> StoreResult<()> {
        if !self.exists(CF_PAYMENTS, payment.id())? {
            return Err(StoreError::NotFound(payment.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_PAYMENTS, payment.id(), payment)?;
        self.write(batch)
    }

    async fn all(&self) -> StoreResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.all_json(CF_PAYMENTS)?;
        payments.sort_by_key(Payment::created_at);
        Ok(payments)
    }
}

#[async_trait]
impl MemberStore for RocksDBStore {
    async fn save(&self, member: &Member) -> StoreResult<()> {
        if self.exists(CF_MEMBERS, member.id())? {
            return Err(StoreError::Duplicate(member.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_MEMBERS, member.id(), member)?;
        batch.put_cf(self.cf(CF_MEMBERS_BY_EMAIL)?, member.email(), member.id());
        self.write(batch)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Member>> {
        self.get_json(CF_MEMBERS, id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        match self.get_string(CF_MEMBERS_BY_EMAIL, email)? {
            Some(member_id) => self.get_json(CF_MEMBERS, &member_id),
            None => Ok(None),
        }
    }

    async fn update(&self, member: &Member) -> StoreResult<()> {
        if !self.exists(CF_MEMBERS, member.id())? {
            return Err(StoreError::NotFound(member.id().to_string()));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_MEMBERS, member.id(), member)?;
        self.write(batch)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let member: Member = self
            .get_json(CF_MEMBERS, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_MEMBERS)?, id);
        batch.delete_cf(self.cf(CF_MEMBERS_BY_EMAIL)?, member.email());
        self.write(batch)
    }
}
