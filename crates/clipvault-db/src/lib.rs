//! Clipvault-DB: database schema, migrations, and query operations.
//!
//! This crate provides the metadata store for clipvault using SQLite with
//! rusqlite and r2d2 connection pooling. It holds no business logic: the
//! lifecycle and link managers own all ordering and consistency decisions,
//! this crate only persists and decodes records.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching the database schema
//! - `queries` - Parameter-bound query operations

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
