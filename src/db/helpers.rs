use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{CheckinStatus, Mood};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid attendance date '{value}'"))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_checkin_status(value: &str) -> Result<CheckinStatus> {
    match value {
        "OnTime" => Ok(CheckinStatus::OnTime),
        "Late" => Ok(CheckinStatus::Late),
        "Remote" => Ok(CheckinStatus::Remote),
        other => Err(anyhow!("unknown check-in status {other}")),
    }
}

pub fn parse_mood(value: &str) -> Result<Mood> {
    match value {
        "Great" => Ok(Mood::Great),
        "Good" => Ok(Mood::Good),
        "Okay" => Ok(Mood::Okay),
        "Tired" => Ok(Mood::Tired),
        "Stressed" => Ok(Mood::Stressed),
        other => Err(anyhow!("unknown mood {other}")),
    }
}
