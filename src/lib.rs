//! folio library
//!
//! Cached, retried access to portfolio content stored in a headless CMS.
//! The modules are exposed for use by the binary and integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod image;
pub mod logging;
pub mod retry;
