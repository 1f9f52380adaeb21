//! Scheduled meetings.
//!
//! # Invariants
//! - `end_time >= start_time` (epoch milliseconds).
//! - Title is non-blank after trimming.

use crate::model::tag::normalize_tags;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type MeetingId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    pub attendees: Vec<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingValidationError {
    BlankTitle,
    EndsBeforeStart { start_time: i64, end_time: i64 },
}

impl Display for MeetingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "meeting title must not be blank"),
            Self::EndsBeforeStart {
                start_time,
                end_time,
            } => write!(
                f,
                "meeting end_time {end_time} is before start_time {start_time}"
            ),
        }
    }
}

impl Error for MeetingValidationError {}

impl NewMeeting {
    /// Trims text fields, cleans the attendee list and checks the time range.
    pub fn normalized(self) -> Result<Self, MeetingValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(MeetingValidationError::BlankTitle);
        }
        if self.end_time < self.start_time {
            return Err(MeetingValidationError::EndsBeforeStart {
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        Ok(Self {
            title,
            description: self.description.trim().to_string(),
            start_time: self.start_time,
            end_time: self.end_time,
            attendees: normalize_tags(&self.attendees),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MeetingValidationError, NewMeeting};

    fn meeting(start_time: i64, end_time: i64) -> NewMeeting {
        NewMeeting {
            title: " Standup ".to_string(),
            description: String::new(),
            start_time,
            end_time,
            attendees: vec!["ana@x.io".to_string(), " ana@x.io".to_string()],
        }
    }

    #[test]
    fn normalized_trims_and_dedupes_attendees() {
        let meeting = meeting(10, 10).normalized().unwrap();
        assert_eq!(meeting.title, "Standup");
        assert_eq!(meeting.attendees, vec!["ana@x.io".to_string()]);
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert_eq!(
            meeting(20, 10).normalized().unwrap_err(),
            MeetingValidationError::EndsBeforeStart {
                start_time: 20,
                end_time: 10
            }
        );
    }
}
