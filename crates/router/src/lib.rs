//! Conversational core: per-contact session engine for the gate-control bot.
//!
//! An inbound message flows through the access gate, the audit-context TTL
//! sweep, and a strict precedence resolution ([`route::resolve`]) that picks
//! exactly one flow handler. Flow handlers read and mutate persisted state
//! through the storage stores and ephemeral state through the
//! [`registry::FlowRegistry`], and drive every outbound action under the
//! process-wide session lock.

pub mod admin;
pub mod audit_ctx;
pub mod flows;
pub mod gate;
pub mod menus;
pub mod registry;
pub mod route;
pub mod router;

pub use {
    registry::{ContactFlows, FlowRegistry},
    route::Route,
    router::Router,
};
