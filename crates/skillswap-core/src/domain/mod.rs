//! Domain layer
//!
//! Entities, repositories, and services for the SkillSwap core:
//!
//! - **user**: the identity directory (users, roles, skills, ratings)
//! - **session**: the session store and lifecycle engine
//! - **booking**: booking validation and session creation
//! - **review**: review settlement and rating recomputation
//! - **clock**: injectable time source for deterministic tests

pub mod booking;
pub mod clock;
pub mod review;
pub mod session;
pub mod user;
