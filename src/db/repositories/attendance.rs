use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::attendance::{
    apply_transition, checkin_status, AttendanceError, ShiftSchedule, SubmitOutcome,
    TransitionSubmission,
};
use crate::db::{
    helpers::{format_date, parse_checkin_status, parse_date, parse_mood, parse_optional_datetime},
    Database,
};
use crate::models::{AttendanceDay, Coordinates};

const SELECT_COLUMNS: &str = "staff_id, date, checkin_at, checkin_status, checkout_at, notes, mood,
     photo_url, checkout_photo_url, latitude, longitude, is_remote";

fn row_to_attendance_day(row: &Row) -> Result<AttendanceDay> {
    let date: String = row.get("date")?;
    let checkin_at: Option<String> = row.get("checkin_at")?;
    let checkin_status: Option<String> = row.get("checkin_status")?;
    let checkout_at: Option<String> = row.get("checkout_at")?;
    let mood: Option<String> = row.get("mood")?;
    let latitude: Option<f64> = row.get("latitude")?;
    let longitude: Option<f64> = row.get("longitude")?;
    let is_remote: i64 = row.get("is_remote")?;

    Ok(AttendanceDay {
        staff_id: row.get("staff_id")?,
        date: parse_date(&date)?,
        checkin_timestamp: parse_optional_datetime(checkin_at, "checkin_at")?,
        checkin_status: checkin_status.as_deref().map(parse_checkin_status).transpose()?,
        checkout_timestamp: parse_optional_datetime(checkout_at, "checkout_at")?,
        notes: row.get("notes")?,
        mood: mood.as_deref().map(parse_mood).transpose()?,
        photo_url: row.get("photo_url")?,
        checkout_photo_url: row.get("checkout_photo_url")?,
        location: match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        },
        is_remote: is_remote != 0,
    })
}

fn load_day(conn: &Connection, staff_id: &str, date: NaiveDate) -> Result<Option<AttendanceDay>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM attendance_days WHERE staff_id = ?1 AND date = ?2"
    ))?;
    let mut rows = stmt.query(params![staff_id, format_date(date)])?;
    let day = match rows.next()? {
        Some(row) => Some(row_to_attendance_day(row)?),
        None => None,
    };
    Ok(day)
}

fn upsert_day(conn: &Connection, day: &AttendanceDay, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO attendance_days (staff_id, date, checkin_at, checkin_status, checkout_at, notes, mood,
             photo_url, checkout_photo_url, latitude, longitude, is_remote, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
         ON CONFLICT(staff_id, date) DO UPDATE SET
             checkout_at = excluded.checkout_at,
             notes = excluded.notes,
             checkout_photo_url = excluded.checkout_photo_url,
             updated_at = excluded.updated_at",
        params![
            day.staff_id,
            format_date(day.date),
            day.checkin_timestamp.map(|dt| dt.to_rfc3339()),
            day.checkin_status.map(|status| status.as_str()),
            day.checkout_timestamp.map(|dt| dt.to_rfc3339()),
            day.notes,
            day.mood.map(|mood| mood.as_str()),
            day.photo_url,
            day.checkout_photo_url,
            day.location.map(|loc| loc.latitude),
            day.location.map(|loc| loc.longitude),
            day.is_remote as i64,
            now.to_rfc3339(),
        ],
    )
    .context("failed to write attendance day")?;
    Ok(())
}

impl Database {
    pub async fn get_attendance_day(
        &self,
        staff_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceDay>> {
        let staff_id = staff_id.to_string();
        self.execute(move |conn| load_day(conn, &staff_id, date)).await
    }

    /// Records for one staff member between `from` and `to`, inclusive, oldest first.
    pub async fn list_attendance(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceDay>> {
        let staff_id = staff_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS}
                 FROM attendance_days
                 WHERE staff_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC"
            ))?;
            let mut rows = stmt.query(params![staff_id, format_date(from), format_date(to)])?;
            let mut days = Vec::new();
            while let Some(row) = rows.next()? {
                days.push(row_to_attendance_day(row)?);
            }
            Ok(days)
        })
        .await
    }

    /// Everyone's records for one day, for the daily roll.
    pub async fn list_attendance_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceDay>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS}
                 FROM attendance_days
                 WHERE date = ?1
                 ORDER BY checkin_at ASC"
            ))?;
            let mut rows = stmt.query(params![format_date(date)])?;
            let mut days = Vec::new();
            while let Some(row) = rows.next()? {
                days.push(row_to_attendance_day(row)?);
            }
            Ok(days)
        })
        .await
    }

    /// Apply a submission to the staff member's record for the local day containing `at`.
    ///
    /// Runs in one transaction, so two submissions for the same (staff, day) cannot both
    /// check in.
    pub async fn record_transition(
        &self,
        staff_id: &str,
        submission: TransitionSubmission,
        at: DateTime<Utc>,
        offset: FixedOffset,
        shift: ShiftSchedule,
    ) -> Result<SubmitOutcome> {
        let staff_id = staff_id.to_string();
        self.execute(move |conn| {
            let local = at.with_timezone(&offset);
            let date = local.date_naive();

            let tx = conn
                .transaction()
                .context("failed to open attendance transaction")?;
            let existing = load_day(&tx, &staff_id, date)?;
            let status = checkin_status(local.time(), &shift, submission.is_remote);

            let next = match apply_transition(existing.as_ref(), &staff_id, date, &submission, at, status) {
                Ok(next) => next,
                Err(AttendanceError::TransitionRejected(reason)) => {
                    return Ok(SubmitOutcome::Rejected { reason })
                }
                Err(err) => {
                    return Ok(SubmitOutcome::Rejected {
                        reason: err.to_string(),
                    })
                }
            };

            upsert_day(&tx, &next, at)?;
            tx.commit().context("failed to commit attendance transaction")?;
            Ok(SubmitOutcome::Accepted { record: next })
        })
        .await
    }

    pub async fn count_attendance_days(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM attendance_days", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
