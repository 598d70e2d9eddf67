//! Institution membership records and the ordered role enumeration.
use serde::{Deserialize, Serialize};

/// Ordered role ranks for institution-scoped authorization.
///
/// A higher rank implies a superset of the permissions of every lower rank,
/// so `>=` on this enum is the sole authorization primitive in the RBAC
/// gate. Variant order is load-bearing: `Viewer < Editor`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Viewer,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Editor => "EDITOR",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "VIEWER" => Some(Role::Viewer),
            "EDITOR" => Some(Role::Editor),
            _ => None,
        }
    }
}

/// Membership of a user in an institution, carrying the granted role.
///
/// The (`id_user`, `id_institution`) pair is the composite key; at most one
/// membership row exists per pair. Deactivated rows are retained but do not
/// grant access.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInstitution {
    pub id_user: String,
    pub id_institution: String,
    pub role: Role,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ranks_are_ordered() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor >= Role::Editor);
        assert!(Role::Editor >= Role::Viewer);
    }

    #[test]
    fn role_round_trips_through_storage_text() {
        for role in [Role::Viewer, Role::Editor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("ADMIN"), None);
    }
}
