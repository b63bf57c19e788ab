//! OCPP action names handled by the networking node.

use std::fmt;
use std::str::FromStr;

use crate::error::OcppNetError;

/// Message types known to this node (OCPP-J `action` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    // CS -> CSMS
    BootNotification,
    SignCertificate,

    // CSMS -> CS
    CertificateSigned,
    Reset,
    ChangeAvailability,
    ClearCache,

    // Bidirectional
    DataTransfer,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Action; 7] = [
        Action::BootNotification,
        Action::SignCertificate,
        Action::CertificateSigned,
        Action::Reset,
        Action::ChangeAvailability,
        Action::ClearCache,
        Action::DataTransfer,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::BootNotification => "BootNotification",
            Action::SignCertificate => "SignCertificate",
            Action::CertificateSigned => "CertificateSigned",
            Action::Reset => "Reset",
            Action::ChangeAvailability => "ChangeAvailability",
            Action::ClearCache => "ClearCache",
            Action::DataTransfer => "DataTransfer",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = OcppNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| OcppNetError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_parse_back() {
        for a in Action::ALL {
            assert_eq!(a.as_str().parse::<Action>().ok(), Some(a));
        }
        assert!("Heartbeat".parse::<Action>().is_err());
    }
}
