use crate::domain::payment::Payment;
use crate::domain::ports::PaymentGateway;
use crate::error::GatewayError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

/// A local gateway used by the binary in place of a real processor.
///
/// Approves every charge with `txn_<payment id>`, unless the amount exceeds
/// the optional decline limit.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    decline_over: Option<Decimal>,
}

impl SimulatedGateway {
    pub fn new(decline_over: Option<Decimal>) -> Self {
        Self { decline_over }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn process_payment(&self, payment: &Payment) -> Result<String, GatewayError> {
        let amount = payment.amount().value();
        if let Some(limit) = self.decline_over
            && amount > limit
        {
            return Err(GatewayError::Declined(format!(
                "amount {} exceeds limit {}",
                amount.normalize(),
                limit.normalize()
            )));
        }

        debug!(payment_id = payment.id(), "simulated charge");
        Ok(format!("txn_{}", payment.id()))
    }

    async fn refund_payment(&self, payment: &Payment, reason: &str) -> Result<(), GatewayError> {
        debug!(payment_id = payment.id(), reason, "simulated refund");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_simulated_gateway_decline_limit() {
        let gateway = SimulatedGateway::new(Some(dec!(100)));
        let small = Payment::new("order-1", dec!(100), "credit_card", BTreeMap::new()).unwrap();
        let large = Payment::new("order-2", dec!(100.01), "credit_card", BTreeMap::new()).unwrap();

        assert_eq!(
            gateway.process_payment(&small).await.unwrap(),
            format!("txn_{}", small.id())
        );
        assert_eq!(
            gateway.process_payment(&large).await.unwrap_err(),
            GatewayError::Declined("amount 100.01 exceeds limit 100".to_string())
        );
        assert!(gateway.refund_payment(&small, "any").await.is_ok());
    }
}
