//! Newtype identifiers. All are version-4 UUIDs (spec §3) except
//! [`ContractNumber`], which has its own human-facing format.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a new random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_id!(ContractId);
uuid_id!(UserId);
uuid_id!(PropertyId);
uuid_id!(InvitationId);
uuid_id!(ObjectionId);
uuid_id!(GuaranteeId);
uuid_id!(MatchRequestId);
uuid_id!(MatchCriteriaId);
uuid_id!(NotificationId);
uuid_id!(DeliveryId);
uuid_id!(DigestId);
uuid_id!(HistoryEntryId);

/// A contract number in the `VH-YYYY-NNNNNN` format (spec §4.1, §6).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractNumber(pub String);

impl ContractNumber {
    /// Builds a contract number from a year and a 1-based per-year sequence.
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!("VH-{year:04}-{sequence:06}"))
    }

    /// Validates the wire format `^VH-\d{4}-\d{6}$` without a regex dependency.
    pub fn is_well_formed(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() != 14 {
            return false;
        }
        s.starts_with("VH-")
            && bytes[7] == b'-'
            && bytes[3..7].iter().all(u8::is_ascii_digit)
            && bytes[8..14].iter().all(u8::is_ascii_digit)
    }
}

impl fmt::Display for ContractNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padded_sequence() {
        assert_eq!(ContractNumber::new(2025, 7).0, "VH-2025-000007");
    }

    #[test]
    fn validates_wire_format() {
        assert!(ContractNumber::is_well_formed("VH-2025-000007"));
        assert!(!ContractNumber::is_well_formed("VH-25-000007"));
        assert!(!ContractNumber::is_well_formed("VH-2025-7"));
        assert!(!ContractNumber::is_well_formed("XX-2025-000007"));
    }
}
