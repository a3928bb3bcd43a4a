//! sessionctl - session control client
//!
//! This library provides the client side of the session control dashboard:
//! viewing, activating, stopping and managing access to shared sessions.

pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod theme;
