//! Shiftlog Store - Local record persistence
//!
//! SQLite-backed durable storage for the three record collections:
//! - Checklists
//! - Non-conformances
//! - Incidents
//!
//! ## Architecture
//!
//! This crate implements the `IRecordStore` port from `shiftlog-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with schema-version migration
//! - [`SqliteRecordStore`] - Full `IRecordStore` implementation
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use shiftlog_store::{DatabasePool, SqliteRecordStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::open(Path::new("/home/user/.local/share/shiftlog/shiftlog.db")).await?;
//! let store = SqliteRecordStore::new(pool.pool().clone());
//! // Use store as IRecordStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteRecordStore;
