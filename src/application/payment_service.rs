use super::locks::EntityLocks;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{PaymentGatewayBox, PaymentStoreBox};
use crate::error::{CommerceError, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

/// Payment use cases.
///
/// Owns the payment store and the gateway. Processing and refunding reload
/// the payment under a per-payment lock, so concurrent calls for the same
/// payment are applied one after the other and the gateway is charged at most
/// once.
pub struct PaymentService {
    payments: PaymentStoreBox,
    gateway: PaymentGatewayBox,
    payment_locks: EntityLocks,
    order_locks: EntityLocks,
}

impl PaymentService {
    pub fn new(payments: PaymentStoreBox, gateway: PaymentGatewayBox) -> Self {
        Self {
            payments,
            gateway,
            payment_locks: EntityLocks::new(),
            order_locks: EntityLocks::new(),
        }
    }

    /// Creates a pending payment for an order that has none yet.
    ///
    /// Input is validated before the store is touched.
    #[instrument(skip(self, metadata))]
    pub async fn create_payment(
        &self,
        order_id: &str,
        amount: Decimal,
        method: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<Payment> {
        let payment = Payment::new(order_id, amount, method, metadata)?;

        let _guard = self.order_locks.lock(order_id).await;
        let existing = self
            .payments
            .find_by_order(order_id)
            .await
            .map_err(|e| CommerceError::store("check existing payment for order", order_id, e))?;
        if existing.is_some() {
            warn!("payment already exists for order");
            return Err(CommerceError::PaymentAlreadyExists(order_id.to_string()));
        }

        self.payments
            .save(&payment)
            .await
            .map_err(|e| CommerceError::store("save payment", payment.id(), e))?;

        info!(payment_id = payment.id(), "payment created");
        Ok(payment)
    }

    /// Settles a pending payment through the gateway.
    ///
    /// A payment that is no longer pending is returned as stored, without
    /// calling the gateway. A gateway failure is recorded as a rejection and
    /// reported as [`CommerceError::PaymentRejected`], which carries the
    /// rejected payment.
    #[instrument(skip(self, id), fields(payment_id = id))]
    pub async fn process_payment(&self, id: &str) -> Result<Payment> {
        if id.trim().is_empty() {
            return Err(CommerceError::InvalidPaymentId);
        }

        let _guard = self.payment_locks.lock(id).await;
        let mut payment = self.load(id).await?;
        if !payment.is_pending() {
            info!(status = %payment.status(), "payment already settled");
            return Ok(payment);
        }

        match self.gateway.process_payment(&payment).await {
            Ok(transaction_id) => {
                payment.approve(transaction_id)?;
                self.payments
                    .update(&payment)
                    .await
                    .map_err(|e| CommerceError::store("record approval of payment", id, e))?;
                info!(transaction_id = payment.transaction_id(), "payment approved");
                Ok(payment)
            }
            Err(gateway) => {
                payment.reject(gateway.to_string())?;
                if let Err(source) = self.payments.update(&payment).await {
                    error!(%gateway, error = %source, "failed to record payment rejection");
                    return Err(CommerceError::RejectionNotRecorded {
                        payment_id: id.to_string(),
                        gateway,
                        source,
                    });
                }
                warn!(%gateway, "payment rejected");
                Err(CommerceError::PaymentRejected {
                    payment: Box::new(payment),
                    source: gateway,
                })
            }
        }
    }

    /// Refunds an approved payment. The gateway is called first; the payment
    /// only changes if the gateway succeeds.
    #[instrument(skip(self, id), fields(payment_id = id))]
    pub async fn refund_payment(&self, id: &str, reason: &str) -> Result<Payment> {
        if id.trim().is_empty() {
            return Err(CommerceError::InvalidPaymentId);
        }

        let _guard = self.payment_locks.lock(id).await;
        let mut payment = self.load(id).await?;
        if payment.status() != PaymentStatus::Approved {
            warn!(status = %payment.status(), "refund refused");
            return Err(CommerceError::RefundNotAllowed(payment.status()));
        }

        if let Err(source) = self.gateway.refund_payment(&payment, reason).await {
            error!(error = %source, "gateway refund failed");
            return Err(CommerceError::RefundFailed {
                payment_id: id.to_string(),
                source,
            });
        }

        payment.refund(reason)?;
        self.payments
            .update(&payment)
            .await
            .map_err(|e| CommerceError::store("record refund of payment", id, e))?;

        info!("payment refunded");
        Ok(payment)
    }

    pub async fn get_payment(&self, id: &str) -> Result<Payment> {
        if id.trim().is_empty() {
            return Err(CommerceError::InvalidPaymentId);
        }
        self.load(id).await
    }

    pub async fn get_payment_by_order(&self, order_id: &str) -> Result<Payment> {
        if order_id.trim().is_empty() {
            return Err(CommerceError::InvalidOrderId);
        }
        self.payments
            .find_by_order(order_id)
            .await
            .map_err(|e| CommerceError::store("load payment for order", order_id, e))?
            .ok_or_else(|| CommerceError::PaymentNotFound(order_id.to_string()))
    }

    /// Every stored payment, for reporting.
    pub async fn all_payments(&self) -> Result<Vec<Payment>> {
        self.payments
            .all()
            .await
            .map_err(|e| CommerceError::store("list", "payments", e))
    }

    async fn load(&self, id: &str) -> Result<Payment> {
        self.payments
            .get(id)
            .await
            .map_err(|e| CommerceError::store("load payment", id, e))?
            .ok_or_else(|| CommerceError::PaymentNotFound(id.to_string()))
    }
}
