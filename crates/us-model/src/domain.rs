//! User store domain names.
//!
//! A domain names one configured user store inside a tenant. Names compare
//! case-insensitively, so they are normalised to upper case on construction
//! and every index keyed by domain uses the normalised form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Separator between a domain and a username in a qualified name.
pub const DOMAIN_SEPARATOR: char = '/';

/// Normalised user store domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Domain name of the primary user store when none is configured.
    pub const PRIMARY: &'static str = "PRIMARY";

    /// Creates a domain name, trimming and upper-casing the input.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidDomainName` if the name is blank or
    /// contains the domain separator.
    pub fn new(name: impl AsRef<str>) -> ModelResult<Self> {
        let raw = name.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(DOMAIN_SEPARATOR) {
            return Err(ModelError::InvalidDomainName(raw.to_string()));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Returns the default primary domain.
    #[must_use]
    pub fn primary() -> Self {
        Self(Self::PRIMARY.to_string())
    }

    /// Derives a domain from a deployment file stem.
    ///
    /// Dots are not portable in every file system layout, so deployment
    /// files spell them as underscores: `wso2_com.toml` is `WSO2.COM`.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidDomainName` if the stem is blank.
    pub fn from_file_stem(stem: &str) -> ModelResult<Self> {
        Self::new(stem.replace('_', "."))
    }

    /// Returns the normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the default primary domain.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.0 == Self::PRIMARY
    }

    /// Compares against a raw name normalised the same way as [`Self::new`].
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw.trim().to_uppercase()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainName {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for DomainName {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<DomainName> for String {
    fn from(domain: DomainName) -> Self {
        domain.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_whitespace() {
        let domain = DomainName::new("  wso2.com ").unwrap();
        assert_eq!(domain.as_str(), "WSO2.COM");
        assert_eq!(domain, DomainName::new("WSO2.com").unwrap());
        assert!(domain.matches("Wso2.Com"));
    }

    #[test]
    fn non_ascii_names_match_their_normalised_form() {
        let domain = DomainName::new("straße.de").unwrap();
        assert_eq!(domain.as_str(), "STRASSE.DE");
        assert!(domain.matches("straße.de"));
        assert!(domain.matches("Strasse.DE"));

        let accented = DomainName::new("émile").unwrap();
        assert!(accented.matches("ÉMILE"));
        assert!(accented.matches(" émile "));
        assert_eq!(accented, DomainName::new("Émile").unwrap());
    }

    #[test]
    fn rejects_blank_and_separator() {
        assert!(DomainName::new("").is_err());
        assert!(DomainName::new("   ").is_err());
        assert_eq!(
            DomainName::new("a/b"),
            Err(ModelError::InvalidDomainName("a/b".to_string()))
        );
    }

    #[test]
    fn file_stem_uses_underscores_for_dots() {
        let domain = DomainName::from_file_stem("wso2_com").unwrap();
        assert_eq!(domain.as_str(), "WSO2.COM");
    }

    #[test]
    fn primary_domain() {
        assert!(DomainName::primary().is_primary());
        assert!(DomainName::new("primary").unwrap().is_primary());
        assert!(!DomainName::new("LDAP").unwrap().is_primary());
    }
}
