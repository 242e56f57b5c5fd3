use super::command::Command;
use crate::application::member_service::MemberService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Drives the services from a command script.
///
/// Keeps the `ref` label to id mapping for the entities the script created.
/// Labels it does not know are passed through as raw ids.
pub struct ScriptRunner {
    members: Arc<MemberService>,
    orders: Arc<OrderService>,
    payments: Arc<PaymentService>,
    labels: HashMap<String, String>,
}

impl ScriptRunner {
    pub fn new(
        members: Arc<MemberService>,
        orders: Arc<OrderService>,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self {
            members,
            orders,
            payments,
            labels: HashMap::new(),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::CreateMember {
                r#ref,
                email,
                name,
                password,
            } => {
                let member = self.members.create_member(&email, &name, &password).await?;
                self.labels.insert(r#ref, member.id().to_string());
            }
            Command::RenameMember { member, name } => {
                let id = self.resolve(&member);
                self.members.update_member(&id, &name).await?;
            }
            Command::DeleteMember { member } => {
                let id = self.resolve(&member);
                self.members.delete_member(&id).await?;
            }
            Command::CreateOrder {
                r#ref,
                customer,
                items,
            } => {
                let customer_id = self.resolve(&customer);
                let order = self.orders.create_order(&customer_id, items).await?;
                self.labels.insert(r#ref, order.id().to_string());
            }
            Command::UpdateOrderStatus { order, status } => {
                let id = self.resolve(&order);
                self.orders.update_status(&id, status).await?;
            }
            Command::CancelOrder { order } => {
                let id = self.resolve(&order);
                self.orders.cancel_order(&id).await?;
            }
            Command::CreatePayment {
                r#ref,
                order,
                amount,
                method,
                metadata,
            } => {
                let order_id = self.resolve(&order);
                let payment = self
                    .payments
                    .create_payment(&order_id, amount, &method, metadata)
                    .await?;
                self.labels.insert(r#ref, payment.id().to_string());
            }
            Command::ProcessPayment { payment } => {
                let id = self.resolve(&payment);
                self.payments.process_payment(&id).await?;
            }
            Command::RefundPayment { payment, reason } => {
                let id = self.resolve(&payment);
                self.payments.refund_payment(&id, &reason).await?;
            }
        }
        Ok(())
    }

    /// All stored orders and payments, for the final report.
    pub async fn snapshot(&self) -> Result<(Vec<Order>, Vec<Payment>)> {
        let orders = self.orders.all_orders().await?;
        let payments = self.payments.all_payments().await?;
        Ok((orders, payments))
    }

    /// The label a script gave to `id`, if any.
    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, known)| known.as_str() == id)
            .map(|(label, _)| label.as_str())
    }

    fn resolve(&self, label_or_id: &str) -> String {
        self.labels
            .get(label_or_id)
            .cloned()
            .unwrap_or_else(|| label_or_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::domain::payment::PaymentStatus;
    use crate::error::CommerceError;
    use crate::infrastructure::in_memory::{
        InMemoryMemberStore, InMemoryOrderStore, InMemoryPaymentStore, ScriptedGateway,
    };
    use crate::interfaces::script::command::CommandReader;

    fn runner() -> ScriptRunner {
        ScriptRunner::new(
            Arc::new(MemberService::new(Box::new(InMemoryMemberStore::new()))),
            Arc::new(OrderService::new(Box::new(InMemoryOrderStore::new()))),
            Arc::new(PaymentService::new(
                Box::new(InMemoryPaymentStore::new()),
                Box::new(ScriptedGateway::new()),
            )),
        )
    }

    #[tokio::test]
    async fn test_runner_resolves_labels() {
        let script = r#"
{"op":"create_order","ref":"o1","customer":"c1","items":[{"product_id":"p1","name":"Pen","unit_price":5,"quantity":2}]}
{"op":"update_order_status","order":"o1","status":"paid"}
{"op":"create_payment","ref":"p1","order":"o1","amount":10,"method":"credit_card"}
{"op":"process_payment","payment":"p1"}
"#;
        let mut runner = runner();
        for (_, command) in CommandReader::new(script.as_bytes()).commands() {
            runner.run(command.unwrap()).await.unwrap();
        }

        let (orders, payments) = runner.snapshot().await.unwrap();
        assert_eq!(orders[0].status(), OrderStatus::Paid);
        assert_eq!(payments[0].status(), PaymentStatus::Approved);
        assert_eq!(payments[0].order_id(), orders[0].id());
        assert_eq!(runner.label_of(orders[0].id()), Some("o1"));
        assert_eq!(runner.label_of(payments[0].id()), Some("p1"));
    }

    #[tokio::test]
    async fn test_runner_surfaces_service_errors() {
        let mut runner = runner();
        let result = runner
            .run(Command::CancelOrder {
                order: "unknown".to_string(),
            })
            .await;
        assert!(matches!(result, Err(CommerceError::OrderNotFound(id)) if id == "unknown"));
    }
}
