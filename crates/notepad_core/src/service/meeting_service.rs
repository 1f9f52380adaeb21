//! Meeting scheduler use-cases.
//!
//! # Invariants
//! - Stored meetings always satisfy `end_time >= start_time`.
//! - Form timestamps are RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (read as UTC)
//!   or epoch milliseconds.

use crate::model::meeting::{Meeting, MeetingValidationError, NewMeeting};
use crate::repo::meeting_repo::MeetingRepository;
use crate::repo::{now_epoch_ms, RepoError};
use chrono::{DateTime, NaiveDateTime};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LOCAL_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug)]
pub enum MeetingServiceError {
    Validation(MeetingValidationError),
    InvalidTimestamp(String),
    Repo(RepoError),
}

impl Display for MeetingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTimestamp(value) => write!(f, "invalid meeting timestamp `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MeetingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidTimestamp(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for MeetingServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MeetingValidationError> for MeetingServiceError {
    fn from(value: MeetingValidationError) -> Self {
        Self::Validation(value)
    }
}

pub struct MeetingService<R: MeetingRepository> {
    repo: R,
}

impl<R: MeetingRepository> MeetingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_meeting(&self, meeting: NewMeeting) -> Result<Meeting, MeetingServiceError> {
        let meeting = meeting.normalized()?;
        let record = Meeting {
            id: Uuid::new_v4(),
            title: meeting.title,
            description: meeting.description,
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            attendees: meeting.attendees,
            created_at: now_epoch_ms(),
        };
        self.repo.insert_meeting(&record)?;
        info!(
            "event=meeting_create module=service status=ok meeting_id={} attendees={}",
            record.id,
            record.attendees.len()
        );
        Ok(record)
    }

    /// Ordered by start time, earliest first.
    pub fn get_meetings(&self) -> Result<Vec<Meeting>, MeetingServiceError> {
        Ok(self.repo.list_meetings()?)
    }
}

/// Parses a meeting form timestamp into epoch milliseconds.
pub fn parse_meeting_time(value: &str) -> Result<i64, MeetingServiceError> {
    let trimmed = value.trim();
    if let Ok(epoch_ms) = trimmed.parse::<i64>() {
        return Ok(epoch_ms);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }
    LOCAL_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| MeetingServiceError::InvalidTimestamp(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_meeting_time, MeetingServiceError};

    #[test]
    fn parses_supported_timestamp_shapes() {
        assert_eq!(parse_meeting_time("1700000000000").unwrap(), 1_700_000_000_000);
        assert_eq!(
            parse_meeting_time("1970-01-01T00:00:01Z").unwrap(),
            1_000
        );
        assert_eq!(parse_meeting_time("1970-01-01T00:01").unwrap(), 60_000);
        assert_eq!(
            parse_meeting_time("1970-01-01T01:00:00+01:00").unwrap(),
            0
        );
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        assert!(matches!(
            parse_meeting_time("next tuesday"),
            Err(MeetingServiceError::InvalidTimestamp(value)) if value == "next tuesday"
        ));
    }
}
