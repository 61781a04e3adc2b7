//! Role type for dashboard access control.
//!
//! Every user carries exactly one role. The role is embedded in issued
//! tokens and read back by the client to gate navigation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization label attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office administrator; may manage other users.
    Admin,
    /// Regular dashboard user.
    User,
    /// Product supplier.
    Supplier,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Supplier];

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the wire label of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Supplier => "supplier",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known role labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    /// The rejected label.
    pub label: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.label)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "supplier" => Ok(Self::Supplier),
            other => Err(ParseRoleError {
                label: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
        assert!(!Role::Supplier.is_admin());
    }

    #[test]
    fn labels_parse_back() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().expect("parse"), role);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.label, "superuser");
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn serialization_format() {
        let json = serde_json::to_string(&Role::Supplier).expect("serialize");
        assert_eq!(json, "\"supplier\"");

        let parsed: Role = serde_json::from_str("\"admin\"").expect("deserialize");
        assert_eq!(parsed, Role::Admin);

        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
