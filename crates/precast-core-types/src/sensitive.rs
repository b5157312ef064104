//! Redaction wrapper for credentials that travel with a request
//!
//! Session identifiers arrive in the `Authorization` header and are handed to
//! the session collaborator. They must never reach a log line.

use std::fmt;

/// Wrapper whose `Debug` and `Display` never print the wrapped value
///
/// ```
/// use precast_core_types::Sensitive;
///
/// let session = Sensitive::new("session-6f1c");
/// assert_eq!(format!("{session:?}"), "***REDACTED***");
/// assert_eq!(session.expose(), &"session-6f1c");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value. Only the session lookup should call this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl From<String> for Sensitive<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_never_formatted() {
        let token = Sensitive::new("4b1f-session".to_string());
        assert_eq!(format!("{:?}", token), "***REDACTED***");
        assert_eq!(format!("{}", token), "***REDACTED***");
    }

    #[test]
    fn test_expose_and_into_inner() {
        let token: Sensitive<String> = "abc".to_string().into();
        assert_eq!(token.expose(), "abc");
        assert_eq!(token.into_inner(), "abc");
    }

    #[test]
    fn test_redacted_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Caller {
            display_name: String,
            session: Sensitive<String>,
        }

        let caller = Caller {
            display_name: "site-supervisor".to_string(),
            session: Sensitive::new("s-123".to_string()),
        };

        let rendered = format!("{:?}", caller);
        assert!(rendered.contains("site-supervisor"));
        assert!(!rendered.contains("s-123"));
    }
}
