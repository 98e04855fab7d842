//! SkillSwap Core Library
//!
//! This crate provides the core functionality for SkillSwap, including:
//! - Booking validation (conflict detection, qualification checks, timing rules)
//! - Session lifecycle state machine (pending → confirmed → completed/cancelled)
//! - Review settlement and aggregate rating recomputation
//! - Storage (SQLite session store and user directory)
//! - In-process API surface mirroring the HTTP contract

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};
