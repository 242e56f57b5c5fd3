use crate::application::order_service::NewOrderItem;
use crate::domain::order::OrderStatus;
use crate::error::{CommerceError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};

/// One line of a command script.
///
/// Entities are named by caller-chosen `ref` labels when created; later
/// commands may use either the label or the stored id.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateMember {
        r#ref: String,
        email: String,
        name: String,
        password: String,
    },
    RenameMember {
        member: String,
        name: String,
    },
    DeleteMember {
        member: String,
    },
    CreateOrder {
        r#ref: String,
        customer: String,
        items: Vec<NewOrderItem>,
    },
    UpdateOrderStatus {
        order: String,
        status: OrderStatus,
    },
    CancelOrder {
        order: String,
    },
    CreatePayment {
        r#ref: String,
        order: String,
        amount: Decimal,
        method: String,
        #[serde(default)]
        metadata: BTreeMap<String, String>,
    },
    ProcessPayment {
        payment: String,
    },
    RefundPayment {
        payment: String,
        reason: String,
    },
}

/// Reads commands from a JSON-lines source.
///
/// Blank lines are skipped. A malformed line yields an error for that line
/// only; reading continues with the next one.
pub struct CommandReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Lazily yields `(line number, command)` pairs.
    pub fn commands(self) -> impl Iterator<Item = (usize, Result<Command>)> {
        self.reader
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !matches!(line, Ok(text) if text.trim().is_empty()))
            .map(|(number, line)| {
                let parsed = line.map_err(CommerceError::from).and_then(|text| {
                    serde_json::from_str::<Command>(&text).map_err(CommerceError::from)
                });
                (number, parsed)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = r#"{"op":"create_order","ref":"o1","customer":"c1","items":[{"product_id":"p1","name":"Pen","unit_price":"2.5","quantity":4}]}

{"op":"update_order_status","order":"o1","status":"paid"}
{"op":"create_payment","ref":"p1","order":"o1","amount":10,"method":"credit_card"}"#;
        let commands: Vec<_> = CommandReader::new(data.as_bytes()).commands().collect();

        assert_eq!(commands.len(), 3);
        let (line, first) = &commands[0];
        assert_eq!(*line, 1);
        let Command::CreateOrder { items, .. } = first.as_ref().unwrap() else {
            panic!("expected create_order");
        };
        assert_eq!(items[0].unit_price, dec!(2.5));

        let (line, second) = &commands[1];
        assert_eq!(*line, 3);
        assert_eq!(
            second.as_ref().unwrap(),
            &Command::UpdateOrderStatus {
                order: "o1".to_string(),
                status: OrderStatus::Paid
            }
        );

        let Command::CreatePayment { amount, metadata, .. } = commands[2].1.as_ref().unwrap() else {
            panic!("expected create_payment");
        };
        assert_eq!(*amount, dec!(10));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "{\"op\":\"teleport\"}\n{\"op\":\"cancel_order\",\"order\":\"o1\"}";
        let commands: Vec<_> = CommandReader::new(data.as_bytes()).commands().collect();

        assert!(commands[0].1.is_err());
        assert!(commands[1].1.is_ok());
    }

    #[test]
    fn test_reader_rejects_unknown_status() {
        let data = r#"{"op":"update_order_status","order":"o1","status":"lost"}"#;
        let commands: Vec<_> = CommandReader::new(data.as_bytes()).commands().collect();
        assert!(commands[0].1.is_err());
    }
}
