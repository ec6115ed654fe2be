// src/report/mod.rs
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::count::{RowCount, StatsRecord};

pub mod merge;

pub use merge::{append_to_existing, merge_tables, MergeOutcome};

pub const FILE_NAME_HEADER: &str = "文件名";
pub const SHEET_NAME_HEADER: &str = "工作表名";
pub const ROW_COUNT_HEADER: &str = "行数";

/// Sheet the report is written to.
pub const REPORT_SHEET: &str = "Sheet1";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<RowCount> for Cell {
    fn from(c: RowCount) -> Self {
        match c {
            RowCount::Rows(n) => Cell::Number(n as f64),
            RowCount::Failed => Cell::Text(c.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Column-oriented report. Names are unique; every column has the same
/// number of cells once `pad_to` has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    columns: Vec<Column>,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the report for a batch of counts, with or without the sheet column.
    pub fn from_stats(stats: &[StatsRecord], with_sheet: bool) -> Self {
        let mut table = ReportTable::new();
        table.push_column(
            FILE_NAME_HEADER,
            stats.iter().map(|s| Cell::Text(s.file_name.clone())).collect(),
        );
        if with_sheet {
            table.push_column(
                SHEET_NAME_HEADER,
                stats
                    .iter()
                    .map(|s| s.sheet_name.clone().map_or(Cell::Empty, Cell::Text))
                    .collect(),
            );
        }
        table.push_column(
            ROW_COUNT_HEADER,
            stats.iter().map(|s| Cell::from(s.row_count)).collect(),
        );
        table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Number of data rows (the longest column).
    pub fn height(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    /// Append a column. The caller keeps names unique.
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) {
        let name = name.into();
        debug_assert!(!self.contains(&name), "duplicate column {name}");
        self.columns.push(Column { name, cells });
    }

    /// `name`, or `name.1`, `name.2`, ... when it is already taken.
    fn dedup_name(&self, name: String) -> String {
        if !self.contains(&name) {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}.{}", name, n);
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Extend every column with empty cells up to `height` rows.
    pub fn pad_to(&mut self, height: usize) {
        for col in &mut self.columns {
            if col.cells.len() < height {
                col.cells.resize(height, Cell::Empty);
            }
        }
    }

    /// Read the first sheet of a workbook; its first row holds the headers.
    pub fn load(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("opening report {}", path.display()))?;
        let first = workbook
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("report {} has no sheets", path.display()))?;
        let range = workbook
            .worksheet_range(&first)
            .with_context(|| format!("reading sheet {} of {}", first, path.display()))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(ReportTable::new());
        };

        let mut table = ReportTable::new();
        for (i, h) in header.iter().enumerate() {
            let name = match h {
                Data::Empty => format!("Unnamed: {}", i),
                other => other.to_string(),
            };
            let name = table.dedup_name(name);
            table.push_column(name, Vec::new());
        }
        for row in rows {
            for (col, cell) in table.columns.iter_mut().zip(row) {
                col.cells.push(Cell::from(cell));
            }
        }
        debug!(
            columns = table.columns.len(),
            rows = table.height(),
            "loaded report"
        );
        Ok(table)
    }

    /// Write the table to `path`, replacing it. The workbook is built in a
    /// temp file next to `path` and renamed over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(REPORT_SHEET)?;

        for (c, column) in self.columns.iter().enumerate() {
            let c = u16::try_from(c).context("too many report columns")?;
            sheet.write_string_with_format(0, c, &column.name, &bold)?;
            for (r, cell) in column.cells.iter().enumerate() {
                let r = u32::try_from(r + 1).context("too many report rows")?;
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) => {
                        sheet.write_number(r, c, *n)?;
                    }
                    Cell::Text(s) => {
                        sheet.write_string(r, c, s)?;
                    }
                }
            }
        }
        let buf = workbook
            .save_to_buffer()
            .context("serializing report workbook")?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(&buf)?;
        tmp.persist(path)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stats() -> Vec<StatsRecord> {
        vec![
            StatsRecord {
                file_name: "a.xlsx".into(),
                sheet_name: Some("小区".into()),
                row_count: RowCount::Rows(7),
            },
            StatsRecord {
                file_name: "b.csv".into(),
                sheet_name: None,
                row_count: RowCount::Failed,
            },
        ]
    }

    #[test]
    fn from_stats_columns() {
        let quick = ReportTable::from_stats(&stats(), false);
        let names: Vec<_> = quick.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["文件名", "行数"]);

        let full = ReportTable::from_stats(&stats(), true);
        assert_eq!(
            full.column(SHEET_NAME_HEADER).unwrap().cells,
            vec![Cell::Text("小区".into()), Cell::Empty]
        );
        assert_eq!(
            full.column(ROW_COUNT_HEADER).unwrap().cells,
            vec![Cell::Number(7.0), Cell::Text("读取失败".into())]
        );
    }

    #[test]
    fn save_then_load_keeps_cells() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.xlsx");
        let table = ReportTable::from_stats(&stats(), true);
        table.save(&path)?;

        let loaded = ReportTable::load(&path)?;
        assert_eq!(loaded, table);
        Ok(())
    }

    #[test]
    fn load_suffixes_repeated_headers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("edited.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        for (c, name) in ["文件名", "行数", "行数", "行数"].iter().enumerate() {
            ws.write_string(0, c as u16, *name)?;
            ws.write_number(1, c as u16, c as f64)?;
        }
        wb.save(&path)?;

        let loaded = ReportTable::load(&path)?;
        let names: Vec<_> = loaded.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["文件名", "行数", "行数.1", "行数.2"]);
        assert_eq!(loaded.column("行数.2").unwrap().cells, vec![Cell::Number(3.0)]);
        Ok(())
    }

    #[test]
    fn load_rejects_non_workbooks() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.xlsx");
        std::fs::write(&path, "plain text")?;
        assert!(ReportTable::load(&path).is_err());
        Ok(())
    }
}
