//! Session domain: entity, lifecycle rules, persistence, and service

pub mod history;
pub mod lifecycle;
pub mod repository;
pub mod service;
pub mod session;

pub use history::StatusChange;
pub use lifecycle::{allowed_targets, permitted_transitions};
pub use repository::SessionRepository;
pub use service::SessionService;
pub use session::{Review, Session, SessionStatus};
