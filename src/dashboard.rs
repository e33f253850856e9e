//! Operator commands against the workbook.
//!
//! Every interaction is a [`Command`] handled start to finish by
//! [`Dashboard::handle`], which returns a one-shot outcome together with the
//! render model of the current page. Nothing about a past outcome is kept
//! between interactions; only the current page and selected sheet are.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::attendance::{self, AttendanceError, EventSummary};
use crate::cache::WorkbookCache;
use crate::leaderboard::{self, LeaderboardRow, TOP_MEMBERS, TopMember};
use crate::members::{self, MemberError};
use crate::points;
use crate::store::StoreError;
use crate::table::{ATTENDANCE_SHEET, MEMBERS_SHEET, Sheet, Workbook};

/// Point deltas outside this range are applied but logged as unusual.
pub const USUAL_POINTS_RANGE: std::ops::RangeInclusive<i64> = -1000..=1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Overview,
    Leaderboard,
    LogPoints,
    AddMember,
    Events,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    LogPoints {
        student_id: String,
        points: i64,
    },
    AddMember {
        #[serde(default)]
        student_id: String,
        name: String,
        #[serde(default)]
        base_points: i64,
    },
    CreateEvent {
        event_name: String,
        attendees: Vec<String>,
    },
    SelectSheet {
        name: String,
    },
    Navigate {
        page: Page,
    },
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Success {
    PointsLogged { student_id: String, points: i64 },
    MemberAdded { student_id: String, name: String },
    EventRecorded { event_name: String, rows: usize },
    SheetSelected { name: String },
    Navigated { page: Page },
    Refreshed,
}

impl Success {
    pub fn message(&self) -> String {
        match self {
            Success::PointsLogged { student_id, points } => {
                format!("Logged {} point(s) for student {}.", points, student_id)
            }
            Success::MemberAdded { student_id, name } => {
                format!("Added {} with Student ID {}.", name, student_id)
            }
            Success::EventRecorded { event_name, rows } => {
                format!("Recorded {} attendance row(s) for '{}'.", rows, event_name)
            }
            Success::SheetSelected { name } => format!("Showing sheet '{}'.", name),
            Success::Navigated { .. } => String::new(),
            Success::Refreshed => "Data refreshed.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Member(#[from] MemberError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error("Student ID is required.")]
    MissingStudentId,

    #[error("Student ID '{0}' not found.")]
    StudentNotFound(String),

    #[error("Sheet '{0}' does not exist.")]
    UnknownSheet(String),
}

impl DashboardError {
    /// Stable tag for machine consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Store(StoreError::NotFound { .. }) => "workbook_missing",
            DashboardError::Store(StoreError::Read { .. }) => "read_failed",
            DashboardError::Store(StoreError::PermissionDenied { .. }) => "permission_denied",
            DashboardError::Store(StoreError::Write { .. }) => "write_failed",
            DashboardError::Member(MemberError::EmptyName) => "empty_name",
            DashboardError::Member(MemberError::StudentIdLineBreak) => "student_id_line_break",
            DashboardError::Member(MemberError::StudentIdTooLong { .. }) => "student_id_too_long",
            DashboardError::Member(MemberError::NameTooLong { .. }) => "name_too_long",
            DashboardError::Member(MemberError::DuplicateStudentId(_)) => "duplicate_student_id",
            DashboardError::Attendance(AttendanceError::EmptyEventName) => "empty_event_name",
            DashboardError::Attendance(AttendanceError::NoAttendeesSelected) => {
                "no_attendees_selected"
            }
            DashboardError::Attendance(AttendanceError::NoAttendeesResolved) => {
                "no_attendees_resolved"
            }
            DashboardError::MissingStudentId => "missing_student_id",
            DashboardError::StudentNotFound(_) => "student_not_found",
            DashboardError::UnknownSheet(_) => "unknown_sheet",
        }
    }

    /// True for bad operator input, as opposed to missing data or I/O trouble.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DashboardError::Member(_)
                | DashboardError::Attendance(_)
                | DashboardError::MissingStudentId
        )
    }
}

/// What the presentation layer should show for the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    MissingWorkbook {
        path: PathBuf,
    },
    LoadFailed {
        message: String,
    },
    NoSheets,
    Overview {
        sheet_names: Vec<String>,
        selected: String,
        table: Sheet,
        top_members: Option<Vec<TopMember>>,
    },
    Leaderboard {
        rows: Vec<LeaderboardRow>,
    },
    LogPoints {
        members: Sheet,
    },
    AddMember {
        suggested_id: String,
        members: Sheet,
    },
    Events {
        member_names: Vec<String>,
        events: Vec<EventSummary>,
    },
}

#[derive(Debug, Serialize)]
pub struct Reply {
    #[serde(skip)]
    pub outcome: Option<Result<Success, DashboardError>>,
    pub view: View,
}

pub struct Dashboard {
    path: PathBuf,
    cache: WorkbookCache,
    page: Page,
    selected_sheet: Option<String>,
}

impl Dashboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Dashboard {
            path: path.into(),
            cache: WorkbookCache::new(),
            page: Page::default(),
            selected_sheet: None,
        }
    }

    /// Handle one interaction and render the page it leaves the operator on.
    pub fn handle(&mut self, command: Command) -> Reply {
        let outcome = self.execute(command);
        match &outcome {
            Ok(success) => log::info!("command succeeded: {:?}", success),
            Err(DashboardError::Store(e)) => log::error!("command failed: {}", e),
            Err(e) => log::info!("command rejected: {}", e),
        }
        Reply {
            outcome: Some(outcome),
            view: self.view(),
        }
    }

    /// Render the current page without running a command.
    pub fn render(&mut self) -> Reply {
        Reply {
            outcome: None,
            view: self.view(),
        }
    }

    fn execute(&mut self, command: Command) -> Result<Success, DashboardError> {
        match command {
            Command::LogPoints { student_id, points } => self.log_points(student_id.trim(), points),
            Command::AddMember {
                student_id,
                name,
                base_points,
            } => self.add_member(student_id.trim(), name.trim(), base_points),
            Command::CreateEvent {
                event_name,
                attendees,
            } => self.create_event(event_name.trim(), &attendees),
            Command::SelectSheet { name } => {
                let workbook = self.cache.load(&self.path)?;
                if workbook.sheet(&name).is_none() {
                    return Err(DashboardError::UnknownSheet(name));
                }
                self.selected_sheet = Some(name.clone());
                self.page = Page::Overview;
                Ok(Success::SheetSelected { name })
            }
            Command::Navigate { page } => {
                self.page = page;
                Ok(Success::Navigated { page })
            }
            Command::Refresh => {
                self.cache.clear();
                Ok(Success::Refreshed)
            }
        }
    }

    fn log_points(&mut self, student_id: &str, points: i64) -> Result<Success, DashboardError> {
        if student_id.is_empty() {
            return Err(DashboardError::MissingStudentId);
        }
        if points == 0 || !USUAL_POINTS_RANGE.contains(&points) {
            log::warn!("unusual point delta {} for student {}", points, student_id);
        }

        let workbook = self.workbook_for_update()?;
        let current = workbook.sheet(MEMBERS_SHEET).cloned().unwrap_or_default();
        let (updated, found) = points::apply_points(&current, student_id, points);
        if !found {
            return Err(DashboardError::StudentNotFound(student_id.to_string()));
        }

        self.cache
            .save(Workbook::new().with_sheet(MEMBERS_SHEET, updated), &self.path)?;
        Ok(Success::PointsLogged {
            student_id: student_id.to_string(),
            points,
        })
    }

    fn add_member(
        &mut self,
        student_id: &str,
        name: &str,
        base_points: i64,
    ) -> Result<Success, DashboardError> {
        let workbook = self.workbook_for_update()?;
        let current = workbook.sheet(MEMBERS_SHEET).cloned().unwrap_or_default();
        let (updated, student_id) = members::add_member(&current, student_id, name, base_points)?;

        self.cache
            .save(Workbook::new().with_sheet(MEMBERS_SHEET, updated), &self.path)?;
        Ok(Success::MemberAdded {
            student_id,
            name: name.to_string(),
        })
    }

    fn create_event(
        &mut self,
        event_name: &str,
        attendees: &[String],
    ) -> Result<Success, DashboardError> {
        let workbook = self.workbook_for_update()?;
        let members = workbook.sheet(MEMBERS_SHEET).cloned().unwrap_or_default();
        let existing = workbook.sheet(ATTENDANCE_SHEET).cloned().unwrap_or_default();

        let updated = attendance::record_attendance(&existing, event_name, attendees, &members)?;
        let rows = updated.len() - existing.len();

        self.cache
            .save(Workbook::new().with_sheet(ATTENDANCE_SHEET, updated), &self.path)?;
        Ok(Success::EventRecorded {
            event_name: event_name.to_string(),
            rows,
        })
    }

    /// Current workbook for a mutation; a missing file counts as empty since
    /// the save that follows creates it.
    fn workbook_for_update(&mut self) -> Result<Arc<Workbook>, DashboardError> {
        match self.cache.load(&self.path) {
            Ok(workbook) => Ok(workbook),
            Err(StoreError::NotFound { .. }) => Ok(Arc::new(Workbook::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn view(&mut self) -> View {
        let workbook = match self.cache.load(&self.path) {
            Ok(workbook) => workbook,
            Err(StoreError::NotFound { path }) => return View::MissingWorkbook { path },
            Err(e) => {
                return View::LoadFailed {
                    message: e.to_string(),
                };
            }
        };

        let members = workbook.sheet(MEMBERS_SHEET).cloned().unwrap_or_default();
        match self.page {
            Page::Overview => self.overview(&workbook),
            Page::Leaderboard => View::Leaderboard {
                rows: leaderboard::rank(&members, workbook.sheet(ATTENDANCE_SHEET)).rows,
            },
            Page::LogPoints => View::LogPoints { members },
            Page::AddMember => View::AddMember {
                suggested_id: members::next_student_id(&members),
                members,
            },
            Page::Events => View::Events {
                member_names: members::member_names(&members),
                events: workbook
                    .sheet(ATTENDANCE_SHEET)
                    .map(attendance::event_summaries)
                    .unwrap_or_default(),
            },
        }
    }

    fn overview(&self, workbook: &Workbook) -> View {
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return View::NoSheets;
        }

        let selected = self
            .selected_sheet
            .as_ref()
            .filter(|name| sheet_names.contains(name))
            .cloned()
            .or_else(|| {
                sheet_names
                    .iter()
                    .find(|name| *name == MEMBERS_SHEET)
                    .cloned()
            })
            .unwrap_or_else(|| sheet_names[0].clone());

        let table = workbook.sheet(&selected).cloned().unwrap_or_default();
        let top_members = leaderboard::top_members(&table, TOP_MEMBERS);

        View::Overview {
            sheet_names,
            selected,
            table,
            top_members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use crate::table::{CellValue, NAME, POINTS, STUDENT_ID};
    use std::path::Path;
    use tempfile::tempdir;

    fn seed(path: &Path) {
        let mut members = Sheet::with_columns([STUDENT_ID, NAME, POINTS]);
        for (id, name, points) in [("1", "Ana", 30), ("2", "Bo", 30), ("3", "Cy", -5)] {
            members.push_record([
                (STUDENT_ID, CellValue::text(id)),
                (NAME, CellValue::text(name)),
                (POINTS, CellValue::Int(points)),
            ]);
        }
        store::save(Workbook::new().with_sheet(MEMBERS_SHEET, members), path).unwrap();
    }

    fn failure(reply: &Reply) -> &DashboardError {
        match &reply.outcome {
            Some(Err(e)) => e,
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn missing_workbook_renders_distinct_view() {
        let dir = tempdir().unwrap();
        let mut dashboard = Dashboard::new(dir.path().join("members.xlsx"));

        assert!(matches!(dashboard.render().view, View::MissingWorkbook { .. }));
    }

    #[test]
    fn overview_defaults_to_members_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.xlsx");
        store::save(Workbook::new().with_sheet("other", Sheet::default()), &path).unwrap();
        seed(&path);

        let mut dashboard = Dashboard::new(&path);
        match dashboard.render().view {
            View::Overview {
                sheet_names,
                selected,
                top_members,
                ..
            } => {
                assert_eq!(sheet_names, ["other", MEMBERS_SHEET]);
                assert_eq!(selected, MEMBERS_SHEET);
                assert_eq!(top_members.map(|t| t.len()), Some(3));
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn logged_points_are_visible_on_next_render() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.xlsx");
        seed(&path);
        let mut dashboard = Dashboard::new(&path);
        dashboard.handle(Command::Navigate {
            page: Page::Leaderboard,
        });

        let reply = dashboard.handle(Command::LogPoints {
            student_id: " 3 ".to_string(),
            points: 40,
        });
        assert!(matches!(reply.outcome, Some(Ok(Success::PointsLogged { .. }))));
        match reply.view {
            View::Leaderboard { rows } => {
                assert_eq!(rows[0].name, "Cy");
                assert_eq!(rows[0].points, 35);
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn unknown_student_is_reported_and_nothing_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.xlsx");
        seed(&path);
        let before = std::fs::read(&path).unwrap();

        let mut dashboard = Dashboard::new(&path);
        let reply = dashboard.handle(Command::LogPoints {
            student_id: "42".to_string(),
            points: 5,
        });
        assert!(matches!(failure(&reply), DashboardError::StudentNotFound(id) if id == "42"));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let reply = dashboard.handle(Command::LogPoints {
            student_id: "  ".to_string(),
            points: 5,
        });
        assert!(matches!(failure(&reply), DashboardError::MissingStudentId));
    }

    #[test]
    fn first_member_creates_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("members.xlsx");
        let mut dashboard = Dashboard::new(&path);

        let reply = dashboard.handle(Command::AddMember {
            student_id: String::new(),
            name: "  Dee ".to_string(),
            base_points: 0,
        });
        match reply.outcome {
            Some(Ok(Success::MemberAdded { student_id, name })) => {
                assert_eq!(student_id, "1");
                assert_eq!(name, "Dee");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(path.exists());
    }

    #[test]
    fn event_recording_preserves_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.xlsx");
        seed(&path);
        let mut dashboard = Dashboard::new(&path);
        dashboard.handle(Command::Navigate { page: Page::Events });

        let reply = dashboard.handle(Command::CreateEvent {
            event_name: "Kickoff".to_string(),
            attendees: vec!["Ana".to_string(), "Bo".to_string()],
        });
        assert!(matches!(
            reply.outcome,
            Some(Ok(Success::EventRecorded { rows: 2, .. }))
        ));
        match reply.view {
            View::Events { events, member_names } => {
                assert_eq!(member_names, ["Ana", "Bo", "Cy"]);
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].attendees, 2);
            }
            other => panic!("unexpected view {:?}", other),
        }

        let on_disk = store::load(&path).unwrap();
        assert_eq!(on_disk.sheet(MEMBERS_SHEET).map(Sheet::len), Some(3));
    }

    #[test]
    fn selecting_unknown_sheet_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.xlsx");
        seed(&path);
        let mut dashboard = Dashboard::new(&path);

        let reply = dashboard.handle(Command::SelectSheet {
            name: "nope".to_string(),
        });
        assert_eq!(failure(&reply).kind(), "unknown_sheet");
    }

    #[test]
    fn commands_parse_from_json() {
        let command: Command = serde_json::from_str(
            r#"{"command":"add_member","name":"Eve"}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::AddMember {
                student_id: String::new(),
                name: "Eve".to_string(),
                base_points: 0,
            }
        );
    }
}
