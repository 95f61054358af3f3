//! TrustZone security-state modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Choice names accepted for `trustzone_mode`.
pub const MODE_NAMES: &[&str] = &["secure-only", "trustzone-enabled", "non-secure-only"];

/// Security state the kernel is built to run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustZoneMode {
    /// Boots secure and never enters the non-secure side.
    SecureOnly,
    /// Runs non-secure with support for calling into the secure side.
    TrustzoneEnabled,
    /// Runs non-secure with no secure-side calls.
    NonSecureOnly,
}

impl TrustZoneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustZoneMode::SecureOnly => "secure-only",
            TrustZoneMode::TrustzoneEnabled => "trustzone-enabled",
            TrustZoneMode::NonSecureOnly => "non-secure-only",
        }
    }

    /// Value of `configRUN_FREERTOS_SECURE_ONLY`.
    pub fn runs_secure_only(&self) -> bool {
        matches!(self, TrustZoneMode::SecureOnly)
    }

    /// Value `configENABLE_TRUSTZONE` must have in this mode.
    pub fn requires_trustzone(&self) -> bool {
        matches!(self, TrustZoneMode::TrustzoneEnabled)
    }
}

impl fmt::Display for TrustZoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustZoneMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secure-only" => Ok(TrustZoneMode::SecureOnly),
            "trustzone-enabled" => Ok(TrustZoneMode::TrustzoneEnabled),
            "non-secure-only" => Ok(TrustZoneMode::NonSecureOnly),
            _ => Err(format!(
                "unknown trustzone mode '{}' (expected one of {})",
                s,
                MODE_NAMES.join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_mode_list() {
        for name in MODE_NAMES {
            let mode: TrustZoneMode = name.parse().unwrap();
            assert_eq!(mode.as_str(), *name);
        }
        assert!("secure".parse::<TrustZoneMode>().is_err());
    }

    #[test]
    fn test_header_flags() {
        assert!(TrustZoneMode::SecureOnly.runs_secure_only());
        assert!(!TrustZoneMode::SecureOnly.requires_trustzone());
        assert!(TrustZoneMode::TrustzoneEnabled.requires_trustzone());
        assert!(!TrustZoneMode::NonSecureOnly.runs_secure_only());
    }
}
