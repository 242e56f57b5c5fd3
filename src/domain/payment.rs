use super::money::Amount;
use crate::error::{CommerceError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Refunded,
}

impl PaymentStatus {
    /// Pending settles exactly once; only an approved payment can be refunded.
    pub fn can_transition_to(self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, to),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    VirtualAccount,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::VirtualAccount => "virtual_account",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "virtual_account" => Ok(PaymentMethod::VirtualAccount),
            _ => Err(CommerceError::InvalidPaymentMethod),
        }
    }
}

/// Auxiliary payment data.
///
/// Reasons recorded by the core live in their own fields so they can never
/// collide with caller-supplied `metadata` keys.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct PaymentDetails {
    pub reject_reason: Option<String>,
    pub refund_reason: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentDetails {
    pub fn with_metadata(metadata: BTreeMap<String, String>) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    id: String,
    order_id: String,
    amount: Amount,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    details: PaymentDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment. Inputs are checked in order: order ID,
    /// amount, method.
    pub fn new(
        order_id: impl Into<String>,
        amount: Decimal,
        method: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self> {
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(CommerceError::InvalidOrderId);
        }
        let amount = Amount::new(amount).ok_or(CommerceError::InvalidPaymentAmount)?;
        let method: PaymentMethod = method.parse()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            details: PaymentDetails::with_metadata(metadata),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn details(&self) -> &PaymentDetails {
        &self.details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    /// Settles a pending payment as approved with the gateway's reference.
    pub fn approve(&mut self, transaction_id: impl Into<String>) -> Result<()> {
        self.transition(PaymentStatus::Approved)?;
        self.transaction_id = Some(transaction_id.into());
        Ok(())
    }

    /// Settles a pending payment as rejected, keeping the gateway's reason.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(PaymentStatus::Rejected)?;
        self.details.reject_reason = Some(reason.into());
        Ok(())
    }

    pub fn refund(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.status != PaymentStatus::Approved {
            return Err(CommerceError::RefundNotAllowed(self.status));
        }
        self.transition(PaymentStatus::Refunded)?;
        self.details.refund_reason = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, to: PaymentStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(CommerceError::InvalidPaymentTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
