use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

pub const ORDER_HEADER: [&str; 6] = ["ref", "order_id", "customer_id", "items", "total", "status"];
pub const PAYMENT_HEADER: [&str; 9] = [
    "ref",
    "payment_id",
    "order",
    "amount",
    "method",
    "status",
    "transaction_id",
    "reject_reason",
    "refund_reason",
];

#[derive(Serialize)]
struct OrderRow<'a> {
    r#ref: &'a str,
    order_id: &'a str,
    customer_id: &'a str,
    items: usize,
    total: String,
    status: &'static str,
}

#[derive(Serialize)]
struct PaymentRow<'a> {
    r#ref: &'a str,
    payment_id: &'a str,
    order: &'a str,
    amount: String,
    method: &'static str,
    status: &'static str,
    transaction_id: &'a str,
    reject_reason: &'a str,
    refund_reason: &'a str,
}

/// Writes the final state of orders and payments as two CSV sections, each
/// with its own header row.
///
/// `label` maps an entity id back to the script label that created it; ids
/// without one get an empty `ref` column.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_orders<'a, F>(&mut self, orders: &[Order], label: F) -> Result<()>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        self.writer.write_record(ORDER_HEADER)?;
        for order in orders {
            self.writer.serialize(OrderRow {
                r#ref: label(order.id()).unwrap_or_default(),
                order_id: order.id(),
                customer_id: order.customer_id(),
                items: order.items().len(),
                total: order.total_amount().to_string(),
                status: order.status().as_str(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_payments<'a, F>(&mut self, payments: &[Payment], label: F) -> Result<()>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        self.writer.write_record(PAYMENT_HEADER)?;
        for payment in payments {
            let details = payment.details();
            self.writer.serialize(PaymentRow {
                r#ref: label(payment.id()).unwrap_or_default(),
                payment_id: payment.id(),
                order: label(payment.order_id()).unwrap_or(payment.order_id()),
                amount: payment.amount().to_string(),
                method: payment.method().as_str(),
                status: payment.status().as_str(),
                transaction_id: payment.transaction_id().unwrap_or_default(),
                reject_reason: details.reject_reason.as_deref().unwrap_or_default(),
                refund_reason: details.refund_reason.as_deref().unwrap_or_default(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
