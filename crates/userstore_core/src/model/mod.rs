//! Domain model for stored user records.
//!
//! # Responsibility
//! - Define the canonical `User` shape shared by service and storage layers.
//! - Own the property encoding used when a user is written as an entity.
//!
//! # Invariants
//! - A user is identified by its email; the email doubles as the entity key.
//! - Users with an empty email are never persisted.

pub mod user;
