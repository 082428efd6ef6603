//! The internal compiler error.

/// An internal compiler error indicating a bug in dexon, not a user input problem.
///
/// These errors should never occur during normal operation. The method body
/// cache raises one when a member matched by scope id has a different
/// prototype than the one requested, which means the scope id scheme is not
/// sound for that input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("got the wrong method");
        assert_eq!(format!("{err}"), "internal compiler error: got the wrong method");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
