//! Export Jobs - Asynchronous export protocol
//!
//! This crate turns templates and catalogs into page documents, persists
//! large catalogs as ordered chunks, hands the work to a rendering worker
//! through an at-least-once dispatch queue and polls the job record until
//! the worker reports a terminal state.
//!
//! # Job lifecycle
//!
//! ```text
//! pending ──► processing ──► completed
//!    │             │
//!    └─────────────┴───────► failed
//! ```
//!
//! Terminal jobs never change again.

mod assembler;
mod blob;
mod chunk;
mod client;
mod config;
mod dispatch;
mod error;
mod job;
mod poll;
mod store;
mod worker;

pub use assembler::*;
pub use blob::*;
pub use chunk::*;
pub use client::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use job::*;
pub use poll::*;
pub use store::*;
pub use worker::*;
