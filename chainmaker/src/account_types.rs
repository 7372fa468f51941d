//! Account-type descriptors, the role catalog, and the validator tally.
//!
//! An account type is written as `"Role:Count"`, for example `"Full:1"` or
//! `"Participant:25"`. Only the `Full` and `Validator` roles carry validator
//! permissions in a generated chain; [`count_validators`] sums their counts so
//! the caller can warn when a chain would start without any validator.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Roles whose accounts are bonded as validators at genesis.
pub const VALIDATOR_ROLES: [&str; 2] = ["Full", "Validator"];

/// A malformed `"Role:Count"` descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountTypeError {
    /// The descriptor does not split into exactly two `:`-separated tokens.
    #[error("'{0}' is not of the form Role:Count")]
    Malformed(String),

    /// The role token is empty.
    #[error("'{0}' has an empty role")]
    EmptyRole(String),

    /// The count token is not an integer.
    #[error("'{descriptor}' has a non-numeric count: {source}")]
    InvalidCount {
        /// The offending descriptor.
        descriptor: String,
        /// Integer parse failure.
        source: ParseIntError,
    },

    /// The count token is a negative integer.
    #[error("'{0}' has a negative count")]
    NegativeCount(String),

    /// The validator total does not fit in a `u64`.
    #[error("validator count overflows")]
    Overflow,
}

/// A single parsed `"Role:Count"` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTypeDescriptor {
    /// Role label, compared case-sensitively.
    pub role: String,
    /// Number of accounts of this role.
    pub count: u64,
}

impl AccountTypeDescriptor {
    /// Whether accounts of this role carry validator permissions.
    #[must_use]
    pub fn is_validator_eligible(&self) -> bool {
        VALIDATOR_ROLES.contains(&self.role.as_str())
    }
}

impl FromStr for AccountTypeDescriptor {
    type Err = AccountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(':').collect();
        let [role, count] = tokens.as_slice() else {
            return Err(AccountTypeError::Malformed(s.to_owned()));
        };
        if role.is_empty() {
            return Err(AccountTypeError::EmptyRole(s.to_owned()));
        }
        let count: i64 = count.parse().map_err(|source| AccountTypeError::InvalidCount {
            descriptor: s.to_owned(),
            source,
        })?;
        let count = u64::try_from(count).map_err(|_| AccountTypeError::NegativeCount(s.to_owned()))?;
        Ok(Self {
            role: (*role).to_owned(),
            count,
        })
    }
}

impl fmt::Display for AccountTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.count)
    }
}

/// Parse every descriptor, failing on the first malformed one.
///
/// # Errors
///
/// Returns the first descriptor's parse error.
pub fn parse_all<S: AsRef<str>>(
    descriptors: &[S],
) -> Result<Vec<AccountTypeDescriptor>, AccountTypeError> {
    descriptors.iter().map(|d| d.as_ref().parse()).collect()
}

/// Total number of validator-eligible accounts across `descriptors`.
///
/// An empty list tallies to zero. Any malformed descriptor fails the whole
/// tally and no partial sum is returned.
///
/// # Errors
///
/// Returns an [`AccountTypeError`] for the first malformed descriptor, or
/// [`AccountTypeError::Overflow`] if the sum exceeds `u64::MAX`.
pub fn count_validators<S: AsRef<str>>(descriptors: &[S]) -> Result<u64, AccountTypeError> {
    descriptors.iter().try_fold(0u64, |total, raw| {
        let descriptor: AccountTypeDescriptor = raw.as_ref().parse()?;
        if descriptor.is_validator_eligible() {
            total
                .checked_add(descriptor.count)
                .ok_or(AccountTypeError::Overflow)
        } else {
            Ok(total)
        }
    })
}

/// Known account roles and their genesis defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Holds every permission, not bonded.
    Root,
    /// Every permission and bonded as a validator.
    Full,
    /// May deploy contracts and create accounts.
    Developer,
    /// May send, call and register names.
    Participant,
    /// Bonded validator with only the bond permission.
    Validator,
}

/// Genesis defaults attached to a [`Role`].
#[derive(Debug, Clone, Copy)]
pub struct RoleDefaults {
    /// Initial token balance.
    pub amount: u64,
    /// Bonded validator power, zero for non-validators.
    pub power: u64,
    /// Permission flags granted at genesis.
    pub permissions: &'static [&'static str],
}

const ALL_PERMISSIONS: &[&str] = &[
    "root",
    "send",
    "call",
    "create_contract",
    "create_account",
    "bond",
    "name",
];

impl Role {
    /// Every role, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Root,
        Self::Full,
        Self::Developer,
        Self::Participant,
        Self::Validator,
    ];

    /// Role label as written in descriptors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Full => "Full",
            Self::Developer => "Developer",
            Self::Participant => "Participant",
            Self::Validator => "Validator",
        }
    }

    /// Genesis defaults for accounts of this role.
    #[must_use]
    pub const fn defaults(self) -> RoleDefaults {
        match self {
            Self::Root => RoleDefaults {
                amount: 9_999_999_999,
                power: 0,
                permissions: ALL_PERMISSIONS,
            },
            Self::Full => RoleDefaults {
                amount: 99_999_999_999_999,
                power: 9_999_999_999,
                permissions: ALL_PERMISSIONS,
            },
            Self::Developer => RoleDefaults {
                amount: 9_999_999_999,
                power: 0,
                permissions: &["send", "call", "create_contract", "create_account", "name"],
            },
            Self::Participant => RoleDefaults {
                amount: 9_999_999_999,
                power: 0,
                permissions: &["send", "call", "name"],
            },
            Self::Validator => RoleDefaults {
                amount: 9_999_999_999,
                power: 9_999_999_998,
                permissions: &["bond"],
            },
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
                format!("unknown account role '{s}', expected one of [{}]", known.join(","))
            })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_only_validator_eligible_roles() {
        let list = ["Validator:1", "Participant:10", "Full:2", "Root:1", "Validator:4"];
        assert_eq!(count_validators(&list), Ok(7));
    }

    #[test]
    fn repeated_eligible_roles_do_not_compound() {
        let list = ["Full:3", "Full:3", "Full:3"];
        assert_eq!(count_validators(&list), Ok(9));
    }

    #[test]
    fn empty_list_is_zero() {
        let list: [&str; 0] = [];
        assert_eq!(count_validators(&list), Ok(0));
    }

    #[test]
    fn non_eligible_roles_contribute_nothing() {
        assert_eq!(count_validators(&["Participant:5", "Developer:3"]), Ok(0));
    }

    #[test]
    fn role_match_is_case_sensitive() {
        assert_eq!(count_validators(&["validator:3", "FULL:2"]), Ok(0));
    }

    #[test]
    fn non_numeric_count_fails_whole_tally() {
        let err = count_validators(&["Full:2", "Validator:abc"]).unwrap_err();
        assert!(matches!(err, AccountTypeError::InvalidCount { ref descriptor, .. } if descriptor == "Validator:abc"));
    }

    #[test]
    fn negative_count_is_rejected() {
        assert_eq!(
            count_validators(&["Validator:-1"]),
            Err(AccountTypeError::NegativeCount("Validator:-1".into()))
        );
    }

    #[test]
    fn wrong_token_count_is_rejected() {
        assert_eq!(
            count_validators(&["Validator"]),
            Err(AccountTypeError::Malformed("Validator".into()))
        );
        assert_eq!(
            count_validators(&["Validator:1:2"]),
            Err(AccountTypeError::Malformed("Validator:1:2".into()))
        );
        assert_eq!(
            count_validators(&[":3"]),
            Err(AccountTypeError::EmptyRole(":3".into()))
        );
    }

    #[test]
    fn overflow_is_an_error() {
        let max = format!("Full:{}", i64::MAX);
        assert_eq!(
            count_validators(&[max.as_str(), max.as_str(), "Validator:2"]),
            Err(AccountTypeError::Overflow)
        );
    }

    #[test]
    fn parses_known_roles_case_sensitively() {
        assert_eq!("Developer".parse::<Role>(), Ok(Role::Developer));
        assert!("developer".parse::<Role>().is_err());
    }

    #[test]
    fn only_validator_roles_are_bonded() {
        for role in Role::ALL {
            let bonded = role.defaults().power > 0;
            assert_eq!(bonded, VALIDATOR_ROLES.contains(&role.as_str()), "{role}");
        }
    }
}
