//! Flow handlers, one module per conversational surface. Each handler is an
//! `impl Router` block dispatched from [`crate::router::Router::handle`].

pub mod audit;
pub mod blacklist;
pub mod commands;
pub mod main_menu;
pub mod users;
