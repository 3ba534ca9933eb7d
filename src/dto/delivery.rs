use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::scoring::{
    DeliveryEvent,
    model::{ExtraType, WicketType},
};

/// Ball submitted by the scorer.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SubmitDeliveryRequest {
    /// Innings the scorer believes is being played. Defaults to the current one.
    #[serde(default)]
    pub innings_id: Option<Uuid>,
    pub batsman_id: Uuid,
    pub bowler_id: Uuid,
    #[validate(range(max = 6))]
    #[serde(default)]
    pub runs_scored: u8,
    #[serde(default)]
    pub is_wicket: bool,
    #[serde(default)]
    pub wicket_type: Option<WicketType>,
    #[serde(default)]
    pub extra_type: Option<ExtraType>,
    #[validate(range(max = 7))]
    #[serde(default)]
    pub extra_runs: u32,
    /// Client-chosen token; resubmitting it never appends a second ball.
    #[serde(default)]
    pub delivery_id: Option<Uuid>,
}

impl From<SubmitDeliveryRequest> for DeliveryEvent {
    fn from(value: SubmitDeliveryRequest) -> Self {
        Self {
            innings_hint: value.innings_id,
            batsman_id: value.batsman_id,
            bowler_id: value.bowler_id,
            runs_scored: value.runs_scored,
            is_wicket: value.is_wicket,
            wicket_type: value.wicket_type,
            extra_type: value.extra_type,
            extra_runs: value.extra_runs,
            delivery_id: value.delivery_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_to_a_dot_ball() {
        let request: SubmitDeliveryRequest = serde_json::from_str(
            r#"{
                "batsman_id": "0b9c7a52-3f1e-4d2a-8c6b-5e4f3a2b1c01",
                "bowler_id": "5a4f3e2d-1c0b-4a9f-8e7d-6c5b4a3f2e10"
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let event = DeliveryEvent::from(request);
        assert_eq!(event.runs_scored, 0);
        assert!(!event.is_wicket);
        assert!(event.extra_type.is_none());
        assert!(event.innings_hint.is_none());
    }

    #[test]
    fn wire_names_for_extras_and_dismissals() {
        let request: SubmitDeliveryRequest = serde_json::from_str(
            r#"{
                "batsman_id": "0b9c7a52-3f1e-4d2a-8c6b-5e4f3a2b1c01",
                "bowler_id": "5a4f3e2d-1c0b-4a9f-8e7d-6c5b4a3f2e10",
                "runs_scored": 9,
                "is_wicket": true,
                "wicket_type": "run_out",
                "extra_type": "no_ball",
                "extra_runs": 1
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
        assert_eq!(request.wicket_type, Some(WicketType::RunOut));
        assert_eq!(request.extra_type, Some(ExtraType::NoBall));
    }

    #[test]
    fn extra_runs_are_bounded() {
        let request: SubmitDeliveryRequest = serde_json::from_str(
            r#"{
                "batsman_id": "0b9c7a52-3f1e-4d2a-8c6b-5e4f3a2b1c01",
                "bowler_id": "5a4f3e2d-1c0b-4a9f-8e7d-6c5b4a3f2e10",
                "runs_scored": 1,
                "extra_type": "no_ball",
                "extra_runs": 4294967295
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
        assert!(DeliveryEvent::from(request).validate().is_err());
    }
}
