//! Application layer: the use cases sequencing validation, entity mutation,
//! collaborator calls and persistence.
//!
//! Each service receives its stores (and, for payments, the gateway) at
//! construction. Every call reloads what it needs from the store, so services
//! hold no entity state and can be shared across tasks behind an `Arc`.

pub mod locks;
pub mod member_service;
pub mod order_service;
pub mod payment_service;
