//! Routing decision types.

use std::fmt;

/// Route names which dialer a connection is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Destination is in the IP list, or no list is configured
    Primary,
    /// Destination is outside the IP list
    Secondary,
}

impl Route {
    /// Route for a membership test result.
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Route::Primary
        } else {
            Route::Secondary
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Primary => "PRIMARY",
            Route::Secondary => "SECONDARY",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
