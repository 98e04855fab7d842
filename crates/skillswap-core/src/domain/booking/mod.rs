//! Booking domain: admission policy and the booking service

pub mod policy;
pub mod service;

pub use policy::BookingPolicy;
pub use service::BookingService;
