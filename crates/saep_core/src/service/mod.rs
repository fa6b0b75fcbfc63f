//! Use-case services over the repositories.
//!
//! # Responsibility
//! - Compose repository calls into multi-step use cases.
//! - Host the maintenance pass that reconciles parent/child collections.

pub mod maintenance;
pub mod opinion_service;
