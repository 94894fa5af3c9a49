//! Back-office library for the MiHogar mortgage origination platform.
//!
//! The heart of the crate is the loan-simulation wizard: a five-step flow that
//! collects loan parameters, keeps derived down-payment totals current, and
//! coordinates with the remote lending backend that performs the actual
//! financial computations (payment plans, TCEA/TIR/VAN, eligibility rules).

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod telemetry;
pub mod workflows;
