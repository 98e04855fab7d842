//! Application layer: input validation for the operation surface

pub mod validators;

pub use validators::{BookingRequest, BookingValidator, ReviewValidator, ValidatedBooking};
