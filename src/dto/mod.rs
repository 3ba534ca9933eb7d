use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod delivery;
pub mod health;
pub mod matches;
pub mod player;
pub mod snapshot;
pub mod sse;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn parse_system_time(raw: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339).map(SystemTime::from)
}
