use std::str::FromStr;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::{
    dao::models::{PlayerProfileEntity, RosterPlayerEntity, TeamEntity},
    scoring::log::Scorecard,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    players: Vec<MongoRosterPlayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoRosterPlayer {
    id: String,
    name: String,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            players: value
                .players
                .into_iter()
                .map(|player| MongoRosterPlayer {
                    id: player.id.to_string(),
                    name: player.name,
                })
                .collect(),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> Result<Self, Self::Error> {
        let players = value
            .players
            .into_iter()
            .map(|player| {
                Ok(RosterPlayerEntity {
                    id: parse_uuid(&player.id)?,
                    name: player.name,
                })
            })
            .collect::<Result<_, MongoDaoError>>()?;
        Ok(Self {
            id: parse_uuid(&value.id)?,
            name: value.name,
            players,
        })
    }
}

/// One document per match: the whole scorecard plus the fields queries filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    pub version: i64,
    created_at: DateTime,
    participants: Vec<String>,
    pub scorecard: Scorecard,
}

impl From<Scorecard> for MongoMatchDocument {
    fn from(scorecard: Scorecard) -> Self {
        Self {
            id: scorecard.match_id().to_string(),
            version: scorecard.version as i64,
            created_at: DateTime::from_system_time(scorecard.info.created_at),
            participants: scorecard
                .player_stats()
                .map(|stat| stat.profile_id.to_string())
                .collect(),
            scorecard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProfileDocument {
    #[serde(rename = "_id")]
    id: String,
    created_at: DateTime,
    first_match_id: String,
}

impl TryFrom<MongoProfileDocument> for PlayerProfileEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoProfileDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: parse_uuid(&value.id)?,
            created_at: value.created_at.to_system_time(),
            first_match_id: parse_uuid(&value.first_match_id)?,
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::from_str(raw).map_err(|err| MongoDaoError::MalformedDocument {
        id: raw.to_owned(),
        reason: err.to_string(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
