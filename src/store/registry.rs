//! Where each logical entity lives in the backing store.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    AuthUser,
}

impl Entity {
    pub const ALL: &'static [Entity] = &[Entity::AuthUser];

    /// Table (or collection) name for this entity.
    pub fn location(self) -> &'static str {
        match self {
            Entity::AuthUser => "auth_users",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::AuthUser => f.write_str("authuser"),
        }
    }
}

/// Locations are spliced into SQL, so they must be bare identifiers.
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_users_live_in_their_own_table() {
        assert_eq!(Entity::AuthUser.location(), "auth_users");
        assert_eq!(Entity::AuthUser.to_string(), "authuser");
    }

    #[test]
    fn registered_locations_are_plain_identifiers() {
        for entity in Entity::ALL {
            assert!(is_plain_identifier(entity.location()), "{entity}");
        }
    }

    #[test]
    fn identifier_check_rejects_sql() {
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("1users"));
        assert!(!is_plain_identifier("users; drop table x"));
        assert!(!is_plain_identifier("Users"));
        assert!(is_plain_identifier("_auth_users2"));
    }
}
