use crate::domain::order::OrderStatus;
use crate::domain::payment::{Payment, PaymentStatus};
use thiserror::Error;

/// Failures reported by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity {0} already exists")]
    Duplicate(String),
    #[error("entity {0} not found")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }
}

/// Failures reported by the external payment gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("declined: {0}")]
    Declined(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("invalid customer ID")]
    InvalidCustomerId,
    #[error("order must have at least one valid item")]
    InvalidOrderItems,
    #[error("invalid order amount")]
    InvalidOrderAmount,
    #[error("invalid order ID")]
    InvalidOrderId,
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("invalid order status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid payment ID")]
    InvalidPaymentId,
    #[error("invalid payment amount")]
    InvalidPaymentAmount,
    #[error("invalid payment method")]
    InvalidPaymentMethod,
    #[error("payment {0} not found")]
    PaymentNotFound(String),
    #[error("payment already exists for order {0}")]
    PaymentAlreadyExists(String),
    #[error("invalid payment status transition from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("refund not allowed for a {0} payment")]
    RefundNotAllowed(PaymentStatus),
    #[error("payment {} rejected by gateway", .payment.id())]
    PaymentRejected {
        payment: Box<Payment>,
        #[source]
        source: GatewayError,
    },
    #[error("failed to record rejection of payment {payment_id} (gateway said: {gateway})")]
    RejectionNotRecorded {
        payment_id: String,
        gateway: GatewayError,
        #[source]
        source: StoreError,
    },
    #[error("refund of payment {payment_id} failed")]
    RefundFailed {
        payment_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid name")]
    InvalidName,
    #[error("invalid password")]
    InvalidPassword,
    #[error("member {0} not found")]
    MemberNotFound(String),
    #[error("member already exists with email {0}")]
    MemberAlreadyExists(String),
    #[error("password hashing failed")]
    PasswordHash,

    #[error("failed to {operation} {id}")]
    Store {
        operation: &'static str,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommerceError {
    /// Wraps a storage failure with the operation and entity it concerned.
    pub fn store(operation: &'static str, id: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            operation,
            id: id.into(),
            source,
        }
    }

    /// True for the "missing resource" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_) | Self::PaymentNotFound(_) | Self::MemberNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
