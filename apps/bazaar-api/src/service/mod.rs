//! # Services
//!
//! Orchestration between the pure pricing pipeline and the database.
//! Handlers stay thin: they extract the request and call into here.

pub mod checkout;

pub use checkout::CheckoutService;
