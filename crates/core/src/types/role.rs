//! Account roles and profile enums.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseRoleError {
    kind: &'static str,
    value: String,
}

/// The type of an account, governing what it may do.
///
/// - `superadmin` manages users and categories.
/// - `owner` and `guest` can publish, comment, and react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    SuperAdmin,
    Owner,
    Guest,
}

impl UserType {
    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "superadmin",
            Self::Owner => "owner",
            Self::Guest => "guest",
        }
    }

    /// Whether this type may be chosen during self-service registration.
    #[must_use]
    pub const fn is_self_registrable(self) -> bool {
        matches!(self, Self::Owner | Self::Guest)
    }

    #[must_use]
    pub const fn is_superadmin(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Self::SuperAdmin),
            "owner" => Ok(Self::Owner),
            "guest" => Ok(Self::Guest),
            other => Err(ParseRoleError {
                kind: "user type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Optional profile gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(ParseRoleError {
                kind: "gender",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserType::SuperAdmin).unwrap(),
            "\"superadmin\""
        );
        let parsed: UserType = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(parsed, UserType::Owner);
    }

    #[test]
    fn test_user_type_round_trips_through_str() {
        for ty in [UserType::SuperAdmin, UserType::Owner, UserType::Guest] {
            assert_eq!(ty.as_str().parse::<UserType>().unwrap(), ty);
        }
        assert!("admin".parse::<UserType>().is_err());
    }

    #[test]
    fn test_only_owner_and_guest_self_register() {
        assert!(UserType::Owner.is_self_registrable());
        assert!(UserType::Guest.is_self_registrable());
        assert!(!UserType::SuperAdmin.is_self_registrable());
    }

    #[test]
    fn test_gender_parse_error_names_kind() {
        let err = "other".parse::<Gender>().unwrap_err();
        assert_eq!(err.to_string(), "unknown gender 'other'");
    }
}
