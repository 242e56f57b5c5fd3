//! Entities, value objects and the ports the application layer depends on.

pub mod member;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
