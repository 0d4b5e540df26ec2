//! Broker API version negotiation
//!
//! Platforms send `X-Broker-Api-Version: <major>.<minor>` with every request.
//! Compatibility policy: only major version 2 is served; any minor revision of it
//! is accepted, since minor revisions of the API only add optional fields.

use std::fmt;
use std::str::FromStr;

use crate::error::BrokerError;

/// A parsed `<major>.<minor>` API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    /// The only major version this broker serves
    pub const SUPPORTED_MAJOR: u32 = 2;

    /// Oldest version accepted
    pub const MINIMUM: ApiVersion = ApiVersion { major: 2, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Check the version against the compatibility policy
    pub fn ensure_supported(&self) -> Result<(), BrokerError> {
        if self.major == Self::SUPPORTED_MAJOR && *self >= Self::MINIMUM {
            Ok(())
        } else {
            Err(BrokerError::UnsupportedVersion(format!(
                "{} (supported: {}.x)",
                self,
                Self::SUPPORTED_MAJOR
            )))
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BrokerError::Decode(format!("Invalid Broker API version: '{}'", s));

        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: parse_component(major).ok_or_else(invalid)?,
            minor: parse_component(minor).ok_or_else(invalid)?,
        })
    }
}

fn parse_component(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
