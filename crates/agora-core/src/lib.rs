//! Core types and voting logic for the Agora forum.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the domain model, the store traits backends implement, and the
//! three pieces of logic built on them: vote reconciliation
//! ([`reconcile`]), content annotation ([`annotate`]) and the top-subs
//! ranking ([`ranking`]).

// Native `async fn` in traits; the store traits spell out `Send` futures
// explicitly.
#![allow(async_fn_in_trait)]

pub mod annotate;
pub mod content;
pub mod error;
pub mod ranking;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod sub;
pub mod user;
pub mod vote;

#[cfg(test)]
mod memory;

pub use error::{Error, Result};
