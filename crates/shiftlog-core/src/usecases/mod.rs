//! Use cases (interactors) for Shiftlog
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AddRecordUseCase`] - The inbound edge: UI forms hand in raw field
//!   sets, the use case assigns identity and queues the record locally.

pub mod add_record;

pub use add_record::{AddRecordUseCase, NewChecklist, NewIncident, NewNonConformance};
