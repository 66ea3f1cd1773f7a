use serde::{Deserialize, Serialize};

/// Role carried by a resolved session. Anything the token names beyond
/// these two parses to `None` and is treated as an unprivileged session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// The caller identity resolved from a session token. Absence of a session
/// is modeled by `Option<Session>` at the resolution boundary; absence of a
/// recognised role by `role: None`. Every consumer has to handle all three
/// shapes explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub role: Option<Role>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Some(Role::Admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_fails_closed() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_admin_requires_admin_role() {
        let admin = Session { user_id: 1, role: Some(Role::Admin) };
        let user = Session { user_id: 2, role: Some(Role::User) };
        let roleless = Session { user_id: 3, role: None };
        assert!(admin.is_admin());
        assert!(!user.is_admin());
        assert!(!roleless.is_admin());
    }
}
