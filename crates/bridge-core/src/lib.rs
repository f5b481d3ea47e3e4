//! # bridge-core
//!
//! Core types shared by every erpbridge crate:
//! - Local entity structs (customers, plans, memberships, invoices)
//! - The [`RemoteId`] newtype for identifiers assigned by the ERP
//! - Billing cadence, entity kind, and payment transaction state enums
//! - ID prefix constants
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod remote;

pub use remote::RemoteId;
