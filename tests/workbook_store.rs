use members_dashboard::table::{ATTENDANCE_SHEET, EVENT, MEMBERS_SHEET, NAME, POINTS, STUDENT_ID};
use members_dashboard::{
    CellValue, Sheet, StoreError, Workbook, WorkbookCache, add_member, apply_points, load, rank,
    record_attendance, save,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn members() -> Sheet {
    let mut sheet = Sheet::with_columns([STUDENT_ID, NAME, POINTS, "Email"]);
    for (id, name, points) in [("1", "Ana", 30), ("2", "Bo", 30), ("3", "Cy", -5)] {
        sheet.push_record([
            (STUDENT_ID, CellValue::text(id)),
            (NAME, CellValue::text(name)),
            (POINTS, CellValue::Int(points)),
            ("Email", CellValue::text(format!("{}@example.org", name.to_lowercase()))),
        ]);
    }
    sheet
}

fn attendance() -> Sheet {
    let mut sheet = Sheet::with_columns([EVENT, STUDENT_ID]);
    for (event, id) in [("Kickoff", "1"), ("Kickoff", "2"), ("Social", "2"), ("Social", "77")] {
        sheet.push_record([(EVENT, CellValue::text(event)), (STUDENT_ID, CellValue::text(id))]);
    }
    sheet
}

fn seed(path: &Path) {
    let workbook = Workbook::new()
        .with_sheet(MEMBERS_SHEET, members())
        .with_sheet(ATTENDANCE_SHEET, attendance())
        .with_sheet("notes", {
            let mut notes = Sheet::with_columns(["Note", "Flag"]);
            notes.push_record([("Note", CellValue::text("keep me")), ("Flag", CellValue::Bool(true))]);
            notes.push_record([("Note", CellValue::Float(2.5))]);
            notes
        });
    save(workbook, path).unwrap();
}

fn leftover_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn save_replaces_one_sheet_and_preserves_the_rest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    seed(&path);
    let before = load(&path).unwrap();

    let (updated, found) = apply_points(before.sheet(MEMBERS_SHEET).unwrap(), "2", -10);
    assert!(found);
    save(Workbook::new().with_sheet(MEMBERS_SHEET, updated.clone()), &path).unwrap();

    let after = load(&path).unwrap();
    assert_eq!(after.sheet_names(), [MEMBERS_SHEET, ATTENDANCE_SHEET, "notes"]);
    assert_eq!(after.sheet(MEMBERS_SHEET), Some(&updated));
    assert_eq!(after.sheet(ATTENDANCE_SHEET), before.sheet(ATTENDANCE_SHEET));
    assert_eq!(after.sheet("notes"), before.sheet("notes"));
    assert_eq!(after.sheet(MEMBERS_SHEET).unwrap().get(1, POINTS), Some(&CellValue::Int(20)));
}

#[test]
fn extra_columns_survive_a_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    seed(&path);

    let loaded = load(&path).unwrap();
    assert_eq!(loaded.sheet(MEMBERS_SHEET), Some(&members()));
    assert_eq!(
        loaded.sheet(MEMBERS_SHEET).unwrap().get(0, "Email"),
        Some(&CellValue::text("ana@example.org"))
    );
}

#[test]
fn failed_save_leaves_file_and_directory_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    seed(&path);
    let bytes_before = fs::read(&path).unwrap();
    let files_before = leftover_files(dir.path());

    // Sheet names may not contain '/', so serialization fails.
    let err = save(Workbook::new().with_sheet("bad/name", members()), &path).unwrap_err();

    assert!(matches!(err, StoreError::Write { .. }), "unexpected error: {err}");
    assert_eq!(fs::read(&path).unwrap(), bytes_before);
    assert_eq!(leftover_files(dir.path()), files_before);
}

#[test]
fn successful_save_leaves_no_temporary_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    seed(&path);
    save(Workbook::new().with_sheet(MEMBERS_SHEET, members()), &path).unwrap();

    assert_eq!(leftover_files(dir.path()), ["members.xlsx"]);
}

#[test]
fn numeric_ids_from_other_tools_compare_as_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    let mut sheet = Sheet::with_columns([STUDENT_ID, NAME, POINTS]);
    sheet.push_record([
        (STUDENT_ID, CellValue::Float(7.0)),
        (NAME, CellValue::text("Num")),
        (POINTS, CellValue::text("12")),
    ]);
    save(Workbook::new().with_sheet(MEMBERS_SHEET, sheet), &path).unwrap();

    let loaded = load(&path).unwrap();
    let members = loaded.sheet(MEMBERS_SHEET).unwrap();
    assert_eq!(members.get(0, STUDENT_ID), Some(&CellValue::Int(7)));

    let (updated, found) = apply_points(members, "7", 3);
    assert!(found);
    assert_eq!(updated.get(0, POINTS), Some(&CellValue::Int(15)));
    assert!(!apply_points(members, "07", 3).1);
}

#[test]
fn full_cycle_through_the_cache() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("members.xlsx");
    seed(&path);
    let mut cache = WorkbookCache::new();

    let workbook = cache.load(&path).unwrap();
    let (with_dee, id) = add_member(workbook.sheet(MEMBERS_SHEET).unwrap(), "", "Dee", 0).unwrap();
    assert_eq!(id, "4");
    cache
        .save(Workbook::new().with_sheet(MEMBERS_SHEET, with_dee), &path)
        .unwrap();

    let workbook = cache.load(&path).unwrap();
    let members = workbook.sheet(MEMBERS_SHEET).unwrap();
    let names = vec!["Dee".to_string(), "Cy".to_string()];
    let attendance =
        record_attendance(workbook.sheet(ATTENDANCE_SHEET).unwrap(), "Workshop", &names, members)
            .unwrap();
    cache
        .save(Workbook::new().with_sheet(ATTENDANCE_SHEET, attendance), &path)
        .unwrap();

    let workbook = cache.load(&path).unwrap();
    let board = rank(
        workbook.sheet(MEMBERS_SHEET).unwrap(),
        workbook.sheet(ATTENDANCE_SHEET),
    );
    let summary: Vec<(usize, &str, i64, usize)> = board
        .rows
        .iter()
        .map(|r| (r.rank, r.name.as_str(), r.points, r.events_attended))
        .collect();
    assert_eq!(
        summary,
        [
            (1, "Ana", 30, 1),
            (2, "Bo", 30, 2),
            (3, "Cy", 0, 1),
            (4, "Dee", 0, 1),
        ]
    );
}

#[test]
fn missing_workbook_is_distinct_from_corrupt_one() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.xlsx");
    assert!(matches!(load(&missing), Err(StoreError::NotFound { .. })));

    let corrupt = dir.path().join("corrupt.xlsx");
    fs::write(&corrupt, b"PK\x03\x04 not really").unwrap();
    assert!(matches!(load(&corrupt), Err(StoreError::Read { .. })));
}
