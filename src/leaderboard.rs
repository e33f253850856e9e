use serde::Serialize;

use crate::attendance::attendance_counts;
use crate::table::{NAME, POINTS, STUDENT_ID, Sheet};

pub const TOP_MEMBERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub student_id: String,
    pub name: String,
    pub points: i64,
    pub events_attended: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub rows: Vec<LeaderboardRow>,
}

/// Bar-chart entry for the top members of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopMember {
    pub name: String,
    pub points: i64,
}

/// Rank every member by points (clamped at 0) descending, then name ascending.
///
/// Ties on both keep sheet order. Ranks run 1..=N with no gaps and no shared
/// positions.
///
/// # Arguments
/// * `members` - The `members` sheet
/// * `attendance` - The `event_attendance` sheet, if the workbook has one;
///   `None` counts zero events for everyone
///
/// # Returns
/// * `Leaderboard` - One row per member, best first
pub fn rank(members: &Sheet, attendance: Option<&Sheet>) -> Leaderboard {
    let counts = attendance.map(attendance_counts).unwrap_or_default();
    let ids = members.column_text(STUDENT_ID);
    let names = members.column_text(NAME);

    let mut rows: Vec<LeaderboardRow> = ids
        .into_iter()
        .zip(names)
        .enumerate()
        .map(|(idx, (student_id, name))| {
            let points = members
                .get(idx, POINTS)
                .map_or(0, |p| p.coerce_points())
                .max(0);
            let events_attended = counts.get(&student_id).copied().unwrap_or(0);
            LeaderboardRow {
                rank: 0,
                student_id,
                name,
                points,
                events_attended,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }

    Leaderboard { rows }
}

/// The `n` highest-scoring rows of a sheet for charting.
///
/// Returns `None` when the sheet lacks a `Name` or `Points` column. Rows with
/// a blank name or non-numeric points are dropped rather than counted as 0.
pub fn top_members(sheet: &Sheet, n: usize) -> Option<Vec<TopMember>> {
    let name_col = sheet.column_index(NAME)?;
    let points_col = sheet.column_index(POINTS)?;

    let mut top: Vec<TopMember> = sheet
        .rows()
        .iter()
        .filter_map(|row| {
            let name = row[name_col].as_text();
            if name.trim().is_empty() {
                return None;
            }
            let points = row[points_col].as_number()?;
            Some(TopMember {
                name,
                points: points as i64,
            })
        })
        .collect();

    top.sort_by(|a, b| b.points.cmp(&a.points));
    top.truncate(n);
    Some(top)
}
