//! Use-case services.
//!
//! # Responsibility
//! - Validate caller input and map it onto datastore operations.
//! - Translate storage misses into domain errors.

pub mod user_service;
