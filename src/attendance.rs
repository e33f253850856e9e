use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::table::{CellValue, EVENT, NAME, STUDENT_ID, Sheet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("Event name is required.")]
    EmptyEventName,

    #[error("Select at least one attendee.")]
    NoAttendeesSelected,

    #[error("None of the selected attendees match a member.")]
    NoAttendeesResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub event: String,
    pub attendees: usize,
}

/// Append one `{Event, StudentID}` row per member matched by name.
///
/// Names are matched exactly against `members.Name`. Unknown names are
/// skipped; a name shared by several members yields one row per member. Fails
/// when the event name is blank, nothing was selected, or no selected name
/// resolved to a member. The event name is stored trimmed.
pub fn record_attendance(
    existing: &Sheet,
    event_name: &str,
    attendee_names: &[String],
    members: &Sheet,
) -> Result<Sheet, AttendanceError> {
    let event_name = event_name.trim();
    if event_name.is_empty() {
        return Err(AttendanceError::EmptyEventName);
    }
    if attendee_names.is_empty() {
        return Err(AttendanceError::NoAttendeesSelected);
    }

    let names = members.column_text(NAME);
    let ids = members.column_text(STUDENT_ID);

    let resolved: Vec<&String> = attendee_names
        .iter()
        .flat_map(|wanted| {
            names
                .iter()
                .zip(&ids)
                .filter(move |(name, _)| *name == wanted)
                .map(|(_, id)| id)
        })
        .collect();

    if resolved.is_empty() {
        return Err(AttendanceError::NoAttendeesResolved);
    }

    let mut updated = if existing.columns().is_empty() {
        Sheet::with_columns([EVENT, STUDENT_ID])
    } else {
        existing.clone()
    };
    for id in resolved {
        updated.push_record([
            (EVENT, CellValue::text(event_name)),
            (STUDENT_ID, CellValue::text(id.as_str())),
        ]);
    }

    Ok(updated)
}

/// Number of attendance rows per `StudentID`.
pub fn attendance_counts(attendance: &Sheet) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    if attendance.column_index(STUDENT_ID).is_none() {
        return counts;
    }
    for id in attendance.column_text(STUDENT_ID) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Distinct events in first-seen order with their attendance row counts.
pub fn event_summaries(attendance: &Sheet) -> Vec<EventSummary> {
    let mut summaries: Vec<EventSummary> = Vec::new();
    if attendance.column_index(EVENT).is_none() {
        return summaries;
    }
    for event in attendance.column_text(EVENT) {
        match summaries.iter_mut().find(|s| s.event == event) {
            Some(summary) => summary.attendees += 1,
            None => summaries.push(EventSummary {
                event,
                attendees: 1,
            }),
        }
    }
    summaries
}
