// src/count/mod.rs
use std::{fmt, path::Path};
use tracing::{error, info, instrument};

use crate::error::ReadError;

pub mod csv_file;
pub mod workbook;

/// Written in place of a row count when a file cannot be read.
pub const FAILURE_MARKER: &str = "读取失败";

/// Sheet name reported for CSV input, which has no sheets of its own.
pub const CSV_SHEET: &str = "CSV";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    Rows(u64),
    Failed,
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Rows(n) => write!(f, "{}", n),
            RowCount::Failed => f.write_str(FAILURE_MARKER),
        }
    }
}

/// One (file, sheet) result. `sheet_name` is `None` for the quick counter
/// and for files that failed before any sheet was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRecord {
    pub file_name: String,
    pub sheet_name: Option<String>,
    pub row_count: RowCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetScope {
    First,
    All,
}

/// How rows are tallied once a sheet is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// Only rows with something in a requested column.
    NonEmpty,
    /// Whatever the format's own reader would report, blank rows included.
    Raw,
}

/// Row rule for one file, resolved from the plan's tally and the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRule {
    /// Rows with a non-blank cell in at least one requested column.
    NonEmpty,
    /// Every record after the header.
    Records,
    /// Last used row number of the sheet, header included.
    Extent,
}

/// Which columns to look at, which sheets to visit, whether the first
/// row is a header, and how rows are tallied.
#[derive(Debug, Clone)]
pub struct CountPlan {
    /// Zero-based column indices.
    pub columns: Vec<usize>,
    pub sheets: SheetScope,
    pub header: bool,
    pub tally: Tally,
    /// Lower-case extensions without the dot.
    pub extensions: &'static [&'static str],
}

impl CountPlan {
    /// Per-sheet count over a user-chosen column range.
    pub fn column_range(columns: Vec<usize>) -> Self {
        CountPlan {
            columns,
            sheets: SheetScope::All,
            header: false,
            tally: Tally::NonEmpty,
            extensions: &["csv", "xls", "xlsx"],
        }
    }

    /// First sheet, counted the way each format's usual reader sizes it:
    /// CSV and XLS give the records under the header, XLSX and XLSB give
    /// the last used row number.
    pub fn quick() -> Self {
        CountPlan {
            columns: vec![0],
            sheets: SheetScope::First,
            header: true,
            tally: Tally::Raw,
            extensions: &["csv", "xls", "xlsx", "xlsb"],
        }
    }

    /// Row rule for a file with lower-case extension `ext`.
    pub fn rule(&self, ext: &str) -> RowRule {
        match (self.tally, ext) {
            (Tally::NonEmpty, _) => RowRule::NonEmpty,
            (Tally::Raw, "xlsx" | "xlsb") => RowRule::Extent,
            (Tally::Raw, _) => RowRule::Records,
        }
    }

    pub fn supports(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| self.extensions.contains(&ext.as_str()))
    }
}

/// Rows counted in one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCount {
    pub name: String,
    pub rows: u64,
}

/// Count `path` under `plan`. Never fails: any error becomes a single
/// failure-marker record so the rest of the batch keeps going.
#[instrument(level = "info", skip(path, plan), fields(path = %path.display()))]
pub fn count_file(path: &Path, plan: &CountPlan) -> Vec<StatsRecord> {
    let file_name = file_name(path);
    let per_sheet = plan.sheets == SheetScope::All;

    match try_count(path, plan) {
        Ok(sheets) => sheets
            .into_iter()
            .map(|sheet| StatsRecord {
                file_name: file_name.clone(),
                sheet_name: per_sheet.then_some(sheet.name),
                row_count: RowCount::Rows(sheet.rows),
            })
            .collect(),
        Err(e) => {
            error!("读取文件 {} 出错：{}", path.display(), e);
            vec![StatsRecord {
                file_name,
                sheet_name: None,
                row_count: RowCount::Failed,
            }]
        }
    }
}

/// Dispatch on extension and count every sheet the plan asks for.
pub fn try_count(path: &Path, plan: &CountPlan) -> Result<Vec<SheetCount>, ReadError> {
    if !plan.supports(path) {
        return Err(ReadError::Unsupported(path.to_path_buf()));
    }

    if extension(path).as_deref() == Some("csv") {
        let rows = csv_file::count_csv(path, plan)?;
        info!(sheet = CSV_SHEET, rows, "counted");
        Ok(vec![SheetCount {
            name: CSV_SHEET.to_string(),
            rows,
        }])
    } else {
        workbook::count_workbook(path, plan)
    }
}

/// Final path component, lossily, for display and the report.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Reject the first requested column that does not exist in a table `width` wide.
pub(crate) fn check_columns(columns: &[usize], width: usize) -> Result<(), ReadError> {
    match columns.iter().find(|&&c| c >= width) {
        Some(&c) => Err(ReadError::ColumnOutOfRange {
            column: c + 1,
            width,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_drops_all_empty_rows() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("cells.csv");
        fs::write(&path, "1,2\n,\n3,4\n")?;

        let stats = count_file(&path, &CountPlan::column_range(vec![0]));
        assert_eq!(
            stats,
            vec![StatsRecord {
                file_name: "cells.csv".into(),
                sheet_name: Some(CSV_SHEET.into()),
                row_count: RowCount::Rows(2),
            }]
        );
        Ok(())
    }

    #[test]
    fn unsupported_extension_is_a_failure_record() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        fs::write(&path, "1\n2\n")?;

        let stats = count_file(&path, &CountPlan::column_range(vec![0]));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].row_count, RowCount::Failed);
        assert_eq!(stats[0].file_name, "notes.txt");
        assert!(matches!(
            try_count(&path, &CountPlan::quick()),
            Err(ReadError::Unsupported(_))
        ));
        Ok(())
    }

    #[test]
    fn xlsb_only_in_quick_plan() {
        let p = Path::new("cells.XLSB");
        assert!(CountPlan::quick().supports(p));
        assert!(!CountPlan::column_range(vec![0]).supports(p));
        assert!(!CountPlan::quick().supports(Path::new("no_extension")));
    }

    #[test]
    fn missing_file_is_a_failure_record() {
        init_test_logging();
        let stats = count_file(Path::new("/nonexistent/cells.csv"), &CountPlan::quick());
        assert_eq!(stats[0].row_count, RowCount::Failed);
        assert_eq!(stats[0].sheet_name, None);
    }

    #[test]
    fn quick_plan_rules_by_format() {
        let quick = CountPlan::quick();
        assert_eq!(quick.rule("csv"), RowRule::Records);
        assert_eq!(quick.rule("xls"), RowRule::Records);
        assert_eq!(quick.rule("xlsx"), RowRule::Extent);
        assert_eq!(quick.rule("xlsb"), RowRule::Extent);
        assert_eq!(CountPlan::column_range(vec![0]).rule("xlsx"), RowRule::NonEmpty);
    }

    #[test]
    fn failure_marker_display() {
        assert_eq!(RowCount::Failed.to_string(), "读取失败");
        assert_eq!(RowCount::Rows(12).to_string(), "12");
    }
}
