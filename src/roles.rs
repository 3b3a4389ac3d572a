//! Role hierarchy and the authorization decision.
//!
//! Roles form a total order: `User < Admin < SuperAdmin`. An account
//! satisfies a required role iff its own role is at least as high, so a
//! higher role always carries a superset of a lower role's permissions.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    /// The authorization decision: does `self` satisfy `required`?
    pub fn authorize(self, required: Role) -> bool {
        self >= required
    }

    /// The maximal role in the hierarchy.
    pub const MAX: Role = Role::SuperAdmin;
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 3] = [Role::User, Role::Admin, Role::SuperAdmin];

    #[test]
    fn test_role_ordering() {
        assert!(Role::User < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert_eq!(Role::MAX, Role::SuperAdmin);
    }

    #[test]
    fn test_authorize_reflexive() {
        for role in ALL {
            assert!(role.authorize(role));
        }
    }

    #[test]
    fn test_authorize_monotonic() {
        // If a role satisfies `x`, it satisfies every requirement below `x`.
        for role in ALL {
            for x in ALL {
                if role.authorize(x) {
                    for y in ALL.iter().filter(|y| **y <= x) {
                        assert!(role.authorize(*y), "{role} should satisfy {y}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_authorize_denies_higher_requirement() {
        assert!(!Role::User.authorize(Role::Admin));
        assert!(!Role::User.authorize(Role::SuperAdmin));
        assert!(!Role::Admin.authorize(Role::SuperAdmin));
        assert!(Role::SuperAdmin.authorize(Role::User));
    }

    #[test]
    fn test_role_serde_labels() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"super-admin\""
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
