//! User domain module
//!
//! The identity directory: users with a role (student or teacher), a list of
//! skills at proficiency levels, and an aggregate rating settled by mutual
//! reviews. The core treats the directory as an external collaborator behind
//! the [`UserDirectory`] trait; a SQLite-backed implementation is provided.

pub mod directory;
pub mod repository;
pub mod user;

pub use directory::UserDirectory;
pub use repository::UserRepository;
pub use user::{Role, SkillEntry, SkillLevel, User};
