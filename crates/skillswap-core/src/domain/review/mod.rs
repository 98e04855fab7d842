//! Review domain: write-once review slots and rating settlement

pub mod repository;
pub mod service;

pub use repository::{ReviewRepository, ReviewSlot};
pub use service::ReviewService;
