//! Shiftlog Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Checklist`, `NonConformance`, `Incident` and the
//!   shared synchronization envelope (`id`, `synced`, `created_at`)
//! - **Use cases** - `AddRecordUseCase` (the inbound edge UI forms call into)
//! - **Port definitions** - Traits for adapters: `RecordStore`,
//!   `RemoteBackend`, `ConnectivityMonitor`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
