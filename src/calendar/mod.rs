/// Calendar entries shared by a user or their teams

mod manager;

pub use manager::CalendarManager;

use crate::{
    error::{AppError, AppResult},
    invitations::sanitize_input,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

/// Stored calendar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub team_id: Option<String>,
    pub created_by: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEntry {
    pub fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            team_id: row.try_get("team_id")?,
            created_by: row.try_get("created_by")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Create/update payload; dates are RFC 3339 timestamps or `YYYY-MM-DD`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarEntryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCalendarEntry {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub team_id: Option<String>,
}

/// Parse an RFC 3339 timestamp, or a bare date as midnight UTC
pub fn parse_entry_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_calendar_entry(request: &CalendarEntryRequest) -> AppResult<ValidCalendarEntry> {
    let title = request.title.as_deref().map(sanitize_input).unwrap_or_default();
    let (start, end) = match (
        non_empty(request.start_date.as_deref()),
        non_empty(request.end_date.as_deref()),
    ) {
        (Some(start), Some(end)) if !title.is_empty() => (start, end),
        _ => {
            return Err(AppError::Validation(
                "Title, start date, and end date are required".to_string(),
            ))
        }
    };

    let (start_date, end_date) = match (parse_entry_date(start), parse_entry_date(end)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(AppError::Validation("Invalid date format".to_string())),
    };

    if start_date > end_date {
        return Err(AppError::Validation(
            "Start date must be before or equal to end date".to_string(),
        ));
    }

    Ok(ValidCalendarEntry {
        title,
        description: request
            .description
            .as_deref()
            .map(sanitize_input)
            .filter(|d| !d.is_empty()),
        start_date,
        end_date,
        team_id: non_empty(request.team_id.as_deref()).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(title: &str, start: &str, end: &str) -> CalendarEntryRequest {
        CalendarEntryRequest {
            title: Some(title.to_string()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(
            parse_entry_date("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_entry_date("2024-05-01T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(parse_entry_date("05/01/2024"), None);
    }

    #[test]
    fn test_required_fields() {
        for bad in [
            request("", "2024-05-01", "2024-05-02"),
            request("Offsite", "", "2024-05-02"),
            request("Offsite", "2024-05-01", "  "),
            CalendarEntryRequest::default(),
        ] {
            assert_eq!(
                validate_calendar_entry(&bad).unwrap_err().to_string(),
                "Title, start date, and end date are required"
            );
        }
    }

    #[test]
    fn test_invalid_dates() {
        let err = validate_calendar_entry(&request("Offsite", "tomorrow", "2024-05-02")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format");
    }

    #[test]
    fn test_start_after_end() {
        let err = validate_calendar_entry(&request("Offsite", "2024-05-03", "2024-05-02")).unwrap_err();
        assert_eq!(err.to_string(), "Start date must be before or equal to end date");

        let same_day = validate_calendar_entry(&request("Offsite", "2024-05-02", "2024-05-02")).unwrap();
        assert_eq!(same_day.start_date, same_day.end_date);
    }

    #[test]
    fn test_sanitizes_text() {
        let valid = validate_calendar_entry(&CalendarEntryRequest {
            description: Some("<i>bring snacks</i>".to_string()),
            team_id: Some("  ".to_string()),
            ..request("<b>Offsite</b>", "2024-05-01", "2024-05-02")
        })
        .unwrap();

        assert_eq!(valid.title, "Offsite");
        assert_eq!(valid.description.as_deref(), Some("bring snacks"));
        assert!(valid.team_id.is_none());
    }
}
