//! # Scan Target Model
//!
//! The single input of an enumeration run: the parent domain whose
//! subdomains are collected.
//!
//! The value is deliberately loosely validated. External tools do their own
//! parsing, the only hard requirements here come from the places the domain
//! is embedded into: command-line arguments, URLs and the run directory name.

use std::fmt;
use std::str::FromStr;

/// A normalized parent domain, e.g. `example.com`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Domain {
    type Err = String;

    /// Parses a string into a `Domain`.
    ///
    /// * Surrounding whitespace and a trailing root dot are removed.
    /// * The name is lowercased.
    /// * Empty input, inner whitespace and path separators are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('.');

        if trimmed.is_empty() {
            return Err("domain cannot be empty".to_string());
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(format!("invalid domain '{trimmed}': contains whitespace"));
        }

        if trimmed.contains(['/', '\\']) {
            return Err(format!("invalid domain '{trimmed}': contains a path separator"));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}
