use thiserror::Error;

use crate::table::{CellValue, NAME, POINTS, STUDENT_ID, Sheet};

pub const MAX_STUDENT_ID_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    #[error("Name is required.")]
    EmptyName,

    #[error("Student ID must not contain line breaks.")]
    StudentIdLineBreak,

    #[error("Student ID is too long ({len} characters, at most {max} allowed).", max = MAX_STUDENT_ID_LEN)]
    StudentIdTooLong { len: usize },

    #[error("Name is too long ({len} characters, at most {max} allowed).", max = MAX_NAME_LEN)]
    NameTooLong { len: usize },

    #[error("Student ID '{0}' already exists.")]
    DuplicateStudentId(String),
}

/// Suggested id for a new member.
///
/// One past the largest id that parses as an integer; when no id parses, one
/// past the row count; `"1"` for an empty sheet. This is a convenience default
/// and does not guarantee uniqueness against ids that are not sequential.
pub fn next_student_id(members: &Sheet) -> String {
    if members.is_empty() {
        return "1".to_string();
    }

    let max = members
        .column_text(STUDENT_ID)
        .iter()
        .filter_map(|id| id.trim().parse::<i64>().ok())
        .max();

    match max {
        Some(max) => max.saturating_add(1).to_string(),
        None => (members.len() + 1).to_string(),
    }
}

/// Check a candidate member against the sheet without changing it.
///
/// `student_id` and `name` are expected to be trimmed already; an empty
/// `student_id` is valid here because [`add_member`] generates one.
pub fn validate_member(members: &Sheet, student_id: &str, name: &str) -> Result<(), MemberError> {
    if name.trim().is_empty() {
        return Err(MemberError::EmptyName);
    }
    if student_id.contains(['\n', '\r']) {
        return Err(MemberError::StudentIdLineBreak);
    }
    let id_len = student_id.chars().count();
    if id_len > MAX_STUDENT_ID_LEN {
        return Err(MemberError::StudentIdTooLong { len: id_len });
    }
    let name_len = name.chars().count();
    if name_len > MAX_NAME_LEN {
        return Err(MemberError::NameTooLong { len: name_len });
    }
    if !student_id.is_empty() && members.column_text(STUDENT_ID).iter().any(|id| id == student_id) {
        return Err(MemberError::DuplicateStudentId(student_id.to_string()));
    }
    Ok(())
}

/// Append a new member and return the new sheet with the id that was used.
///
/// An empty `student_id` is replaced by [`next_student_id`]. The row is
/// appended at the end with `base_points` stored as given (no clamping). On
/// failure the input sheet is untouched.
///
/// # Arguments
/// * `members` - The `members` sheet
/// * `student_id` - Requested id, or `""` to generate one
/// * `name` - Display name; must not be blank
/// * `base_points` - Starting points
///
/// # Returns
/// * `Result<(Sheet, String), MemberError>` - The sheet with the new row and
///   the id it was given, or the first validation failure
pub fn add_member(
    members: &Sheet,
    student_id: &str,
    name: &str,
    base_points: i64,
) -> Result<(Sheet, String), MemberError> {
    validate_member(members, student_id, name)?;

    let student_id = if student_id.is_empty() {
        let generated = next_student_id(members);
        // Generated ids can still collide with non-sequential existing ones.
        validate_member(members, &generated, name)?;
        generated
    } else {
        student_id.to_string()
    };

    let mut updated = if members.columns().is_empty() {
        Sheet::with_columns([STUDENT_ID, NAME, POINTS])
    } else {
        members.clone()
    };
    updated.push_record([
        (STUDENT_ID, CellValue::text(student_id.as_str())),
        (NAME, CellValue::text(name)),
        (POINTS, CellValue::Int(base_points)),
    ]);

    Ok((updated, student_id))
}

/// Member names in sheet order, skipping blanks.
pub fn member_names(members: &Sheet) -> Vec<String> {
    members
        .column_text(NAME)
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .collect()
}
