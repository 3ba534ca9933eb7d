mod common;

use std::time::Duration;

use cricket_score_back::{
    config::AppConfig,
    dto::{
        matches::TossRequest,
        snapshot::{MatchSnapshot, ResultOutcome},
    },
    error::ServiceError,
    scoring::model::{ElectedTo, MatchStatus},
    services::{match_service, player_service, scoring_service},
    state::AppState,
};
use uuid::Uuid;

use common::{bowled, delivery, fixture, wide};

fn total_balls(snapshot: &MatchSnapshot) -> usize {
    snapshot
        .innings
        .iter()
        .flat_map(|innings| &innings.segments)
        .map(|segment| segment.balls.len())
        .sum()
}

#[tokio::test]
async fn one_over_match_runs_from_toss_to_result() {
    let fx = fixture(Duration::from_secs(5)).await;
    let created = fx.create_match(1, 2).await;
    let match_id = created.match_info.id;
    assert_eq!(created.match_info.status, MatchStatus::Toss);

    let mut events = fx.state.public_sse().subscribe();

    let ongoing = match_service::record_toss(
        &fx.state,
        match_id,
        TossRequest {
            winner_id: fx.home.id,
            elected_to: ElectedTo::Bat,
        },
    )
    .await
    .unwrap();
    assert_eq!(ongoing.match_info.status, MatchStatus::Ongoing);

    let opener = fx.home.players[0].id;
    let away_bowler = fx.away.players[0].id;
    let mut snapshot = ongoing;
    for runs in [4, 6, 1, 0, 0, 2] {
        snapshot = scoring_service::submit_delivery(
            &fx.state,
            match_id,
            delivery(opener, away_bowler, runs),
        )
        .await
        .unwrap();
    }
    assert_eq!(snapshot.match_info.status, MatchStatus::InningsBreak);
    assert_eq!(snapshot.innings[0].score, 13);
    assert_eq!(snapshot.innings[0].overs_display, "1.0");
    assert_eq!(snapshot.innings[0].batting_team_id, fx.home.id);

    let rejected =
        scoring_service::submit_delivery(&fx.state, match_id, delivery(opener, away_bowler, 1))
            .await;
    assert!(matches!(rejected, Err(ServiceError::InvalidRequest(_))));

    let chase = match_service::start_second_innings(&fx.state, match_id)
        .await
        .unwrap();
    assert_eq!(chase.match_info.status, MatchStatus::Ongoing);
    assert_eq!(chase.innings[1].batting_team_id, fx.away.id);

    let chaser = fx.away.players[1].id;
    let home_bowler = fx.home.players[1].id;
    let mut snapshot = chase;
    for request in [
        delivery(chaser, home_bowler, 6),
        wide(chaser, home_bowler),
        bowled(chaser, home_bowler),
        delivery(fx.away.players[2].id, home_bowler, 4),
        delivery(fx.away.players[2].id, home_bowler, 3),
    ] {
        snapshot = scoring_service::submit_delivery(&fx.state, match_id, request)
            .await
            .unwrap();
    }

    assert_eq!(snapshot.match_info.status, MatchStatus::Completed);
    assert_eq!(snapshot.innings[1].score, 14);
    assert_eq!(snapshot.innings[1].overs_display, "0.4");
    let result = snapshot.result.expect("completed match has a result");
    assert_eq!(result.outcome, ResultOutcome::Won);
    assert_eq!(result.winner_team_id, Some(fx.away.id));
    assert_eq!(result.margin_wickets, Some(1));

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.extend(event.event);
    }
    let status_changes = names
        .iter()
        .filter(|name| *name == "match.status_changed")
        .count();
    // toss, innings break, second innings, completion
    assert_eq!(status_changes, 4);
    assert_eq!(names.iter().filter(|name| *name == "score.updated").count(), 11);

    let career = player_service::career(&fx.state, opener).await.unwrap();
    assert_eq!(career.matches_played, 1);
    assert_eq!(career.runs, 13);
    assert_eq!(career.balls_faced, 6);

    let bowler = player_service::career(&fx.state, home_bowler).await.unwrap();
    assert_eq!(bowler.wickets, 1);
    assert_eq!(bowler.runs_conceded, 14);
    assert_eq!(bowler.overs_bowled_display, "0.4");
}

#[tokio::test]
async fn resubmitted_delivery_is_recorded_once() {
    let fx = fixture(Duration::from_secs(5)).await;
    let match_id = fx.create_match(20, 10).await.match_info.id;
    match_service::record_toss(
        &fx.state,
        match_id,
        TossRequest {
            winner_id: fx.away.id,
            elected_to: ElectedTo::Field,
        },
    )
    .await
    .unwrap();

    let mut request = delivery(fx.home.players[0].id, fx.away.players[0].id, 4);
    request.delivery_id = Some(Uuid::new_v4());

    let first = scoring_service::submit_delivery(&fx.state, match_id, request.clone())
        .await
        .unwrap();
    let again = scoring_service::submit_delivery(&fx.state, match_id, request)
        .await
        .unwrap();

    assert_eq!(first.version, again.version);
    assert_eq!(total_balls(&again), 1);
    assert_eq!(again.innings[0].score, 4);
    // Away won the toss and fielded, so home bats first.
    assert_eq!(again.innings[0].batting_team_id, fx.home.id);
}

#[tokio::test]
async fn deliveries_before_the_toss_are_rejected() {
    let fx = fixture(Duration::from_secs(5)).await;
    let match_id = fx.create_match(20, 10).await.match_info.id;

    let result = scoring_service::submit_delivery(
        &fx.state,
        match_id,
        delivery(fx.home.players[0].id, fx.away.players[0].id, 1),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));

    let snapshot = match_service::get_snapshot(&fx.state, match_id)
        .await
        .unwrap();
    assert!(snapshot.innings.is_empty());
    assert_eq!(snapshot.version, 0);
}

#[tokio::test]
async fn unknown_match_and_unknown_innings_are_not_found() {
    let fx = fixture(Duration::from_secs(5)).await;
    let missing = scoring_service::submit_delivery(
        &fx.state,
        Uuid::new_v4(),
        delivery(fx.home.players[0].id, fx.away.players[0].id, 1),
    )
    .await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));

    let match_id = fx.create_match(20, 10).await.match_info.id;
    match_service::record_toss(
        &fx.state,
        match_id,
        TossRequest {
            winner_id: fx.home.id,
            elected_to: ElectedTo::Bat,
        },
    )
    .await
    .unwrap();
    let mut request = delivery(fx.home.players[0].id, fx.away.players[0].id, 1);
    request.innings_id = Some(Uuid::new_v4());
    let result = scoring_service::submit_delivery(&fx.state, match_id, request).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn match_creation_checks_the_teams() {
    let fx = fixture(Duration::from_secs(5)).await;

    let mut request = fx.match_request(20, 10);
    request.away_team_id = Uuid::new_v4();
    let result = match_service::create_match(&fx.state, request).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let mut request = fx.match_request(20, 10);
    request.away_team_id = request.home_team_id;
    let result = match_service::create_match(&fx.state, request).await;
    assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));

    fx.create_match(20, 10).await;
    fx.create_match(10, 5).await;
    let listed = match_service::list_matches(&fx.state).await.unwrap();
    assert_eq!(listed.len(), 2);
    let mut limits: Vec<u32> = listed.iter().map(|summary| summary.overs_limit).collect();
    limits.sort_unstable();
    assert_eq!(limits, [10, 20]);
}

#[tokio::test]
async fn degraded_state_refuses_scoring() {
    let state = AppState::new(AppConfig::default());
    let result = scoring_service::submit_delivery(
        &state,
        Uuid::new_v4(),
        delivery(Uuid::new_v4(), Uuid::new_v4(), 1),
    )
    .await;
    let err = result.unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
    assert!(err.is_transient());
}
