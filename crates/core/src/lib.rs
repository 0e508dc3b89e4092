//! QAcart Core - Shared domain types library.
//!
//! This crate provides the domain types used across all QAcart components:
//! - `storefront` - Public course site (progress tracking, certificates)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! database access, no HTTP clients. Everything that decides *what* a progress
//! record or a certificate looks like lives here; the storefront decides *where*
//! it is stored.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, progress records, certificates,
//!   subscriptions, eligibility verdicts and field patches

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
