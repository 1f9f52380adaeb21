//! Meeting persistence.

use crate::db::ensure_tables;
use crate::model::meeting::Meeting;
use crate::repo::{from_json_text, parse_uuid, to_json_text, RepoResult};
use rusqlite::{params, Connection};

pub trait MeetingRepository {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<()>;
    /// Ordered by `start_time` ascending.
    fn list_meetings(&self) -> RepoResult<Vec<Meeting>>;
}

pub struct SqliteMeetingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeetingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["meetings"])?;
        Ok(Self { conn })
    }
}

impl MeetingRepository for SqliteMeetingRepository<'_> {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO meetings (
                id, title, description, start_time, end_time, attendees, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                meeting.id.to_string(),
                meeting.title,
                meeting.description,
                meeting.start_time,
                meeting.end_time,
                to_json_text(&meeting.attendees, "meetings.attendees")?,
                meeting.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_meetings(&self) -> RepoResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, start_time, end_time, attendees, created_at
             FROM meetings
             ORDER BY start_time ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let attendees: String = row.get("attendees")?;
            meetings.push(Meeting {
                id: parse_uuid(&id, "meetings.id")?,
                title: row.get("title")?,
                description: row.get("description")?,
                start_time: row.get("start_time")?,
                end_time: row.get("end_time")?,
                attendees: from_json_text(&attendees, "meetings.attendees")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(meetings)
    }
}
