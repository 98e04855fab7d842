//! Input validators
//!
//! Pure checks over raw request data. Validators run before any store or
//! directory access and fail on the first violated rule, so callers get
//! exactly one error per attempt.

pub mod booking_validator;
pub mod review_validator;

pub use booking_validator::{BookingRequest, BookingValidator, ValidatedBooking};
pub use review_validator::ReviewValidator;
