use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    Artist,
    #[default]
    Listener,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Artist => "artist",
            Self::Listener => "listener",
        }
    }

    /// Anything that is not "artist" carries no extra capabilities, so it
    /// normalizes to Listener.
    pub fn from_str(s: &str) -> Self {
        match s {
            "artist" => Self::Artist,
            _ => Self::Listener,
        }
    }

    /// Single capability gate for album mutation. Album create/update/delete
    /// consult this instead of comparing role strings.
    pub fn can_manage_albums(&self) -> bool {
        matches!(self, Self::Artist)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> String {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("artist"), Role::Artist);
        assert_eq!(Role::from_str("listener"), Role::Listener);
        assert_eq!(Role::Artist.as_str(), "artist");
    }

    #[test]
    fn test_unknown_role_normalizes_to_listener() {
        assert_eq!(Role::from_str("admin"), Role::Listener);
        assert_eq!(Role::from_str(""), Role::Listener);
    }

    #[test]
    fn test_only_artists_manage_albums() {
        assert!(Role::Artist.can_manage_albums());
        assert!(!Role::Listener.can_manage_albums());
    }
}
