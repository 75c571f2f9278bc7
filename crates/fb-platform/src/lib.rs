//! Fastbreak Platform
//!
//! Core platform providing:
//! - Sports events with venues and poster images
//! - Event creation with compensating rollback
//! - Event search by name and sport
//! - Authentication through an external identity provider
//! - PostgreSQL, object storage and in-memory adapters

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod operations;
pub mod repository;
pub mod service;
pub mod storage;

pub use config::PlatformConfig;
pub use domain::*;
pub use error::PlatformError;
