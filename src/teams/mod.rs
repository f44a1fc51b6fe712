/// Teams, membership, and per-team roles

mod manager;
pub mod roles;

pub use manager::TeamManager;
pub use roles::UserRole;

use serde::{Deserialize, Serialize};

/// Longest accepted team name
pub const MAX_TEAM_NAME_LENGTH: usize = 100;

/// Team creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
