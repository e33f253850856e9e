use serde::Serialize;

pub const MEMBERS_SHEET: &str = "members";
pub const ATTENDANCE_SHEET: &str = "event_attendance";

pub const STUDENT_ID: &str = "StudentID";
pub const NAME: &str = "Name";
pub const POINTS: &str = "Points";
pub const EVENT: &str = "Event";

/// A single cell of a sheet.
///
/// Values read from a workbook keep their type; integral floats are stored as
/// `Int` so that ids such as `7` render as `"7"` rather than `"7.0"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Builds a numeric cell, folding integral values into `Int`.
    pub fn number(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            CellValue::Int(value as i64)
        } else {
            CellValue::Float(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Renders the cell the way identifiers and names are compared.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric content of the cell, if it has any.
    ///
    /// Text is accepted when it parses as a number, mirroring a lenient
    /// "to numeric" conversion; everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if f.is_finite() => Some(*f),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Points value of the cell: anything non-numeric or missing counts as 0.
    /// Fractional values are truncated toward zero.
    pub fn coerce_points(&self) -> i64 {
        match self {
            CellValue::Int(i) => *i,
            CellValue::Text(s) => match s.trim().parse::<i64>() {
                Ok(i) => i,
                Err(_) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map_or(0, |f| f as i64),
            },
            other => other.as_number().map_or(0, |f| f as i64),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// One rectangular table: a header row plus data rows of the same width.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Sheet {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Sheet {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a sheet from a header and rows; short rows are padded with
    /// `Empty` and long rows are cut to the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Sheet { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the index of `name`, appending the column (filled with
    /// `Empty`) when the sheet does not have it yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        self.columns.len() - 1
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Sets a cell, adding the column if needed. Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, column: &str, value: CellValue) {
        let col = self.ensure_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            r[col] = value;
        }
    }

    /// Appends a row from `(column, value)` pairs. Columns the sheet lacks are
    /// added; columns not mentioned are left `Empty`.
    pub fn push_record<'a, I>(&mut self, record: I)
    where
        I: IntoIterator<Item = (&'a str, CellValue)>,
    {
        let mut row = vec![CellValue::Empty; self.columns.len()];
        for (column, value) in record {
            let col = self.ensure_column(column);
            if col >= row.len() {
                row.resize(col + 1, CellValue::Empty);
            }
            row[col] = value;
        }
        self.rows.push(row);
    }

    /// Text of `column` for every row; rows are yielded as `""` when the column
    /// is missing.
    pub fn column_text(&self, column: &str) -> Vec<String> {
        match self.column_index(column) {
            Some(col) => self.rows.iter().map(|r| r[col].as_text()).collect(),
            None => vec![String::new(); self.rows.len()],
        }
    }
}

/// All sheets of a workbook, in workbook order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Workbook {
    sheets: Vec<(String, Sheet)>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Replaces the sheet called `name` in place, or appends it.
    pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = sheet,
            None => self.sheets.push((name, sheet)),
        }
    }

    /// Copies every sheet of `patch` into this workbook.
    pub fn merge(&mut self, patch: Workbook) {
        for (name, sheet) in patch.sheets {
            self.insert(name, sheet);
        }
    }

    pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
        self.insert(name, sheet);
        self
    }
}
