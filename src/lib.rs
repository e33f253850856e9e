/*!
# Members Dashboard

Points and event-attendance tracking for a membership roster kept in a
single spreadsheet workbook.

## Overview

The workbook (by default `data/members.xlsx`) is the only datastore. It holds
a `members` sheet (`StudentID`, `Name`, `Points`) and an `event_attendance`
sheet (`Event`, `StudentID`); any other sheets and columns are carried
through untouched.

## Architecture

### Store
- **store**: reads every sheet of the workbook, and saves by merging named
  sheets into the file on disk, writing a temporary file in the same
  directory and renaming it over the original
- **cache**: per-path read cache with a generation counter that saves bump

### Domain logic
- **table**: cells, sheets and workbooks in memory
- **points**: adding or deducting points by Student ID
- **members**: member validation, id generation and creation
- **attendance**: resolving attendee names and appending attendance rows
- **leaderboard**: dense ranking and the top-members chart data

### Interaction surface
- **dashboard**: operator commands (log points, add member, create event,
  select sheet, navigate, refresh) producing a one-shot outcome and a view
- **app**: JSON HTTP API over the dashboard (feature `web`)
- **config**: command-line configuration and logging setup

## REST API Endpoints

- `GET /api/view` - Renders the current page
- `POST /api/command` - Runs one command, e.g. `{"command":"log_points","student_id":"7","points":5}`
- `GET /api/health` - Liveness check
*/

pub mod attendance;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod leaderboard;
pub mod members;
pub mod points;
pub mod store;
pub mod table;

#[cfg(feature = "web")]
pub mod app;

pub use attendance::{AttendanceError, attendance_counts, event_summaries, record_attendance};
pub use cache::WorkbookCache;
pub use dashboard::{Command, Dashboard, DashboardError, Page, Reply, Success, View};
pub use leaderboard::{Leaderboard, LeaderboardRow, TopMember, rank, top_members};
pub use members::{MemberError, add_member, next_student_id};
pub use points::apply_points;
pub use store::{StoreError, load, save};
pub use table::{CellValue, Sheet, Workbook};
