//! tasktrack library
//!
//! This library exposes the server, the optimistic view-model and the
//! HTTP client so the binary and the integration tests share them.

pub mod app;
pub mod client;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod optimistic;
pub mod services;
pub mod session;
pub mod storage;
