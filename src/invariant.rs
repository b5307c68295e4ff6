//! Defect signalling.
//!
//! States that can only be reached through a bug in this crate or its caller
//! are reported here: logged, then turned into a panic. They are never
//! returned as [`crate::Error`] values.

use std::fmt::Display;

/// Log `what` and abort the current operation.
#[track_caller]
#[cold]
pub fn violated(what: impl Display) -> ! {
    let location = std::panic::Location::caller();
    tracing::error!(%location, "invariant violated: {what}");
    panic!("invariant violated: {what}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "invariant violated: selection out of order")]
    fn test_violated_panics_with_message() {
        violated("selection out of order");
    }
}
