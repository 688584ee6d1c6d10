//! Core types and trait definitions for the Herald follow/notify engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod document;
pub mod error;
pub mod mail;
pub mod message;
pub mod notification;
pub mod partner;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
