//! Domain error kinds.
//!
//! Every failure leaving the store is classified into exactly one
//! [`ErrorKind`]. The transport layer maps kinds to statuses without ever
//! seeing database-specific error types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a failed catalog operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The entity does not exist.
    NotFound,
    /// A unique constraint was violated.
    Duplicate,
    /// Malformed or out-of-range input reached the storage boundary.
    Validation,
    /// A semantically invalid combination (e.g. an unknown category).
    BusinessRule,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller is authenticated but not allowed.
    Forbidden,
    /// Anything else, including connection failures.
    Internal,
}

impl ErrorKind {
    /// HTTP status equivalent for this kind.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Duplicate => 409,
            Self::Validation => 400,
            Self::BusinessRule => 422,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::Internal => 500,
        }
    }

    /// Whether details may be shown to the caller.
    ///
    /// Internal errors are only described in server-side logs.
    #[must_use]
    pub const fn is_client_visible(self) -> bool {
        !matches!(self, Self::Internal)
    }

    /// Stable machine-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::Validation => "validation",
            Self::BusinessRule => "business_rule",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Duplicate.http_status(), 409);
        assert_eq!(ErrorKind::Validation.http_status(), 400);
        assert_eq!(ErrorKind::BusinessRule.http_status(), 422);
        assert_eq!(ErrorKind::Unauthorized.http_status(), 401);
        assert_eq!(ErrorKind::Forbidden.http_status(), 403);
        assert_eq!(ErrorKind::Internal.http_status(), 500);
    }

    #[test]
    fn test_only_internal_is_hidden() {
        assert!(!ErrorKind::Internal.is_client_visible());
        assert!(ErrorKind::Duplicate.is_client_visible());
    }

    #[test]
    fn test_serde_names_match_as_str() {
        let json = serde_json::to_string(&ErrorKind::BusinessRule).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorKind::BusinessRule.as_str()));
    }
}
