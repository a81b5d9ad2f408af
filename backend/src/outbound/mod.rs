//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **rest**: the hosted platform's tables, remote procedures and auth API
//!   over reqwest.
//! - **device_store**: the device key-value store as a JSON file inside a
//!   capability-scoped directory.
//!
//! Adapters are thin translators between domain types and wire
//! representations. They contain no business logic.

pub mod device_store;
pub mod rest;
