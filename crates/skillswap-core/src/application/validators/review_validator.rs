//! Review validation
//!
//! Validates review payloads before the session is loaded.

use crate::error::{Error, Result};

/// Validator for review submissions
pub struct ReviewValidator;

impl ReviewValidator {
    /// Validate a rating
    ///
    /// Rules:
    /// - Must be an integer between 1 and 5 inclusive
    pub fn validate_rating(rating: i64) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(Error::validation(
                "rating",
                "Rating must be an integer between 1 and 5",
            ));
        }
        Ok(())
    }

    /// Validate a comment and return it trimmed
    ///
    /// Rules:
    /// - Must be non-empty after trimming
    pub fn validate_comment(comment: &str) -> Result<String> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(Error::validation("comment", "Comment cannot be empty"));
        }
        Ok(comment.to_string())
    }
}
