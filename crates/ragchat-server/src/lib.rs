//! RagChat Server Library
//!
//! The default [`ragchat_core::service::RagService`] and its HTTP API.

pub mod handlers;
pub mod models;
pub mod server;
pub mod service;

pub use server::{router, start};
pub use service::DefaultRagService;
