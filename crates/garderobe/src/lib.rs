//! Rental lifecycle and ledger engine for physical garment bookings.
//!
//! The engine owns the booking state machine, the resource-overlap scheduler,
//! the custodial wallet ledger, refund/extension policy, and the hub custody
//! pipeline with quality-control gating. Storage is injected through the
//! [`workflows::rental::RentalStore`] unit of work, so everything here runs
//! against the in-memory store in tests and against a real database in
//! deployments.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
