/// User and team role levels
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Permission tier of a user, globally and within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Leads a team; the only role allowed to invite
    TeamLead,
    /// Regular team member
    TeamMember,
    /// Registered user without team privileges
    BasicUser,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::TeamLead, UserRole::TeamMember, UserRole::BasicUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::TeamLead => "team_lead",
            UserRole::TeamMember => "team_member",
            UserRole::BasicUser => "basic_user",
        }
    }

    /// Check if this role may send invitations for a team
    pub fn can_invite(&self) -> bool {
        matches!(self, UserRole::TeamLead)
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Invalid role: {}", s)))
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_team_lead_can_invite() {
        assert!(UserRole::TeamLead.can_invite());
        assert!(!UserRole::TeamMember.can_invite());
        assert!(!UserRole::BasicUser.can_invite());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("team_lead".parse::<UserRole>().unwrap(), UserRole::TeamLead);
        assert_eq!("team_member".parse::<UserRole>().unwrap(), UserRole::TeamMember);
        assert_eq!("basic_user".parse::<UserRole>().unwrap(), UserRole::BasicUser);

        assert!("TEAM_LEAD".parse::<UserRole>().is_err());
        assert!("admin".parse::<UserRole>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_matches_as_str() {
        for role in UserRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }
}
