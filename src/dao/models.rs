use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::scoring::model::PlayerStat;

/// Team stored in persistence together with its roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Players registered for the team.
    #[serde(default)]
    pub players: Vec<RosterPlayerEntity>,
}

/// Player listed on a team roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterPlayerEntity {
    /// User id, also the key of the player's profile.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// Profile created the first time a user is involved in a delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProfileEntity {
    /// User the profile belongs to.
    pub user_id: Uuid,
    /// When the profile was created.
    pub created_at: SystemTime,
    /// Match in which the player first appeared.
    pub first_match_id: Uuid,
}

/// Match-scoped figures of a player, tagged with the match they come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMatchStatEntity {
    /// Match the figures belong to.
    pub match_id: Uuid,
    /// Figures for that match.
    pub stat: PlayerStat,
}
