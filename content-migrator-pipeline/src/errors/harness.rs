//! Error classification consumed by the processing harness.

/// Classification hook the harness uses to separate tolerated 404s from
/// genuine failures. Implemented by every pipeline error type that can wrap
/// a management API error.
pub trait ErrorClass {
    /// True when the error is a remote 404 for the processed item.
    fn is_not_found(&self) -> bool {
        false
    }
}

impl ErrorClass for content_migrator_api::ApiError {
    fn is_not_found(&self) -> bool {
        content_migrator_api::ApiError::is_not_found(self)
    }
}
