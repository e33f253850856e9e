use crate::table::{CellValue, POINTS, STUDENT_ID, Sheet};

/// Add `delta` points to every member whose `StudentID` equals `student_id`.
///
/// Ids are compared as text, exactly: `"7"` and `"07"` are different members.
/// Existing points are coerced first (missing or non-numeric counts as 0).
/// Nothing is clamped here.
///
/// # Arguments
/// * `members` - The `members` sheet
/// * `student_id` - Id to match against the `StudentID` column
/// * `delta` - Points to add; negative values deduct
///
/// # Returns
/// * `(Sheet, bool)` - The updated sheet and whether any row matched. When
///   nothing matched the sheet is returned unchanged.
pub fn apply_points(members: &Sheet, student_id: &str, delta: i64) -> (Sheet, bool) {
    let Some(id_col) = members.column_index(STUDENT_ID) else {
        return (members.clone(), false);
    };

    let matches: Vec<usize> = members
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row[id_col].as_text() == student_id)
        .map(|(idx, _)| idx)
        .collect();

    if matches.is_empty() {
        return (members.clone(), false);
    }

    let mut updated = members.clone();
    for idx in matches {
        let current = updated
            .get(idx, POINTS)
            .map_or(0, CellValue::coerce_points);
        updated.set(idx, POINTS, CellValue::Int(current.saturating_add(delta)));
    }

    (updated, true)
}
