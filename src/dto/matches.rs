use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    dto::{format_system_time, parse_system_time},
    scoring::model::{ElectedTo, MatchInfo, MatchStatus, Toss},
};

/// Payload used to schedule a new match between two seeded teams.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_distinct_teams"))]
pub struct CreateMatchRequest {
    #[validate(length(min = 1, max = 120))]
    pub venue: String,
    /// RFC 3339 start time.
    #[validate(custom(function = "validate_rfc3339"))]
    pub scheduled_at: String,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    #[validate(range(min = 1))]
    pub overs_limit: u32,
    #[validate(range(min = 1, max = 10))]
    pub wickets_limit: u32,
    #[serde(default)]
    pub umpire_id: Option<Uuid>,
}

impl CreateMatchRequest {
    /// Parsed start time. Only meaningful once the request has been validated.
    pub fn scheduled_time(&self) -> Option<SystemTime> {
        parse_system_time(&self.scheduled_at).ok()
    }
}

fn validate_distinct_teams(request: &CreateMatchRequest) -> Result<(), ValidationError> {
    if request.home_team_id == request.away_team_id {
        let mut err = ValidationError::new("distinct_teams");
        err.message = Some("home and away teams must be different".into());
        return Err(err);
    }
    Ok(())
}

fn validate_rfc3339(raw: &str) -> Result<(), ValidationError> {
    parse_system_time(raw).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("rfc3339");
        err.message = Some("scheduled_at must be an RFC 3339 timestamp".into());
        err
    })
}

/// Toss result submitted before play starts.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct TossRequest {
    pub winner_id: Uuid,
    pub elected_to: ElectedTo,
}

impl From<TossRequest> for Toss {
    fn from(value: TossRequest) -> Self {
        Self {
            winner_id: value.winner_id,
            elected_to: value.elected_to,
        }
    }
}

/// Toss as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TossSummary {
    pub winner_id: Uuid,
    pub elected_to: ElectedTo,
}

/// Match header exposed to REST/SSE clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSummary {
    pub id: Uuid,
    pub venue: String,
    pub scheduled_at: String,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub toss: Option<TossSummary>,
    pub overs_limit: u32,
    pub wickets_limit: u32,
    pub status: MatchStatus,
    pub umpire_id: Option<Uuid>,
    pub created_at: String,
}

impl From<&MatchInfo> for MatchSummary {
    fn from(info: &MatchInfo) -> Self {
        Self {
            id: info.id,
            venue: info.venue.clone(),
            scheduled_at: format_system_time(info.scheduled_at),
            home_team_id: info.home_team_id,
            away_team_id: info.away_team_id,
            toss: info.toss.map(|toss| TossSummary {
                winner_id: toss.winner_id,
                elected_to: toss.elected_to,
            }),
            overs_limit: info.rules.overs_limit,
            wickets_limit: info.rules.wickets_limit,
            status: info.status,
            umpire_id: info.umpire_id,
            created_at: format_system_time(info.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateMatchRequest {
        CreateMatchRequest {
            venue: "Wankhede".into(),
            scheduled_at: "2026-03-14T14:00:00Z".into(),
            home_team_id: Uuid::new_v4(),
            away_team_id: Uuid::new_v4(),
            overs_limit: 20,
            wickets_limit: 10,
            umpire_id: None,
        }
    }

    #[test]
    fn well_formed_request_passes() {
        let request = request();
        assert!(request.validate().is_ok());
        assert!(request.scheduled_time().is_some());
    }

    #[test]
    fn limits_and_teams_are_checked() {
        let same_teams = CreateMatchRequest {
            away_team_id: Uuid::nil(),
            home_team_id: Uuid::nil(),
            ..request()
        };
        assert!(same_teams.validate().is_err());

        for (overs_limit, wickets_limit) in [(0, 10), (20, 0), (20, 11)] {
            let invalid = CreateMatchRequest {
                overs_limit,
                wickets_limit,
                ..request()
            };
            assert!(invalid.validate().is_err());
        }

        let bad_time = CreateMatchRequest {
            scheduled_at: "tomorrow".into(),
            ..request()
        };
        assert!(bad_time.validate().is_err());
    }
}
