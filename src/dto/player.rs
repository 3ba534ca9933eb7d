use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerMatchStatEntity, PlayerProfileEntity},
    dto::format_system_time,
    scoring::model::Overs,
};

/// Career figures of a player, summed over every match they appeared in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CareerSummary {
    pub user_id: Uuid,
    /// When the profile was first created.
    pub profile_created_at: String,
    pub matches_played: u32,
    pub runs: u32,
    pub balls_faced: u32,
    pub dismissals: u32,
    pub wickets: u32,
    pub overs_bowled: f64,
    pub overs_bowled_display: String,
    pub runs_conceded: u32,
}

impl CareerSummary {
    /// Fold the match-scoped rows of `profile` into one career line.
    pub fn build(profile: &PlayerProfileEntity, rows: &[PlayerMatchStatEntity]) -> Self {
        let legal_balls_bowled: u32 = rows
            .iter()
            .map(|row| row.stat.overs_bowled.legal_balls())
            .sum();
        let overs = Overs::from_legal_balls(legal_balls_bowled);

        Self {
            user_id: profile.user_id,
            profile_created_at: format_system_time(profile.created_at),
            matches_played: rows.len() as u32,
            runs: rows.iter().map(|row| row.stat.runs).sum(),
            balls_faced: rows.iter().map(|row| row.stat.balls_faced).sum(),
            dismissals: rows.iter().filter(|row| row.stat.is_out).count() as u32,
            wickets: rows.iter().map(|row| row.stat.wickets).sum(),
            overs_bowled: overs.as_decimal(),
            overs_bowled_display: overs.to_string(),
            runs_conceded: rows.iter().map(|row| row.stat.runs_conceded).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::scoring::model::PlayerStat;

    #[test]
    fn overs_are_summed_as_balls_not_decimals() {
        let user_id = Uuid::new_v4();
        let profile = PlayerProfileEntity {
            user_id,
            created_at: SystemTime::UNIX_EPOCH,
            first_match_id: Uuid::new_v4(),
        };
        let row = |legal_balls: u32, runs: u32, is_out: bool| PlayerMatchStatEntity {
            match_id: Uuid::new_v4(),
            stat: PlayerStat {
                runs,
                balls_faced: runs,
                is_out,
                wickets: 1,
                overs_bowled: Overs::from_legal_balls(legal_balls),
                runs_conceded: 10,
                ..PlayerStat::new(user_id)
            },
        };

        // 1.4 + 0.5 overs is 2.3, not 1.9.
        let summary = CareerSummary::build(&profile, &[row(10, 12, true), row(5, 30, false)]);
        assert_eq!(summary.matches_played, 2);
        assert_eq!(summary.runs, 42);
        assert_eq!(summary.dismissals, 1);
        assert_eq!(summary.wickets, 2);
        assert_eq!(summary.overs_bowled_display, "2.3");
        assert_eq!(summary.runs_conceded, 20);
        assert_eq!(summary.profile_created_at, "1970-01-01T00:00:00Z");
    }
}
