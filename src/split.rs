// src/split.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use glob::{glob, Pattern};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::{
    fs,
    io::Write,
    ops::Range,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, instrument};

use crate::{count::file_name, decode, error::ReadError};

/// One output sheet: its name and the source column spans it copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetView {
    pub name: String,
    pub columns: Vec<Range<usize>>,
}

impl SheetView {
    pub fn new(name: impl Into<String>, columns: Vec<Range<usize>>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Source column indices present in a table `width` wide, in output order.
    pub fn indices(&self, width: usize) -> Vec<usize> {
        self.columns
            .iter()
            .flat_map(|r| r.clone())
            .filter(|&c| c < width)
            .collect()
    }
}

/// Sheets written for each CSV, in workbook order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLayout {
    pub views: Vec<SheetView>,
}

impl Default for SplitLayout {
    /// KPI/MR columns 1-52 on the first sheet; the 5 key columns plus
    /// 53-62 on the second.
    fn default() -> Self {
        SplitLayout {
            views: vec![
                SheetView::new("KPI,MR处理", vec![0..52]),
                SheetView::new("数据处理", vec![0..5, 52..62]),
            ],
        }
    }
}

/// Files converted and files skipped by one folder pass.
#[derive(Debug, Default)]
pub struct SplitSummary {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Number if the field, ignoring surrounding whitespace, parses as a finite float.
fn as_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_records(text: &str) -> Result<Vec<StringRecord>, ReadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    rdr.records().map(|r| r.map_err(ReadError::from)).collect()
}

fn write_view(sheet: &mut Worksheet, records: &[StringRecord], columns: &[usize]) -> Result<()> {
    for (out_c, &src_c) in columns.iter().enumerate() {
        let out_c = u16::try_from(out_c).context("too many output columns")?;
        for (r, record) in records.iter().enumerate() {
            let r = u32::try_from(r).context("too many rows for a worksheet")?;
            // written as parsed; the csv reader already unquoted it
            let value = record.get(src_c).unwrap_or("");
            if value.is_empty() {
                continue;
            }
            // header row stays text
            match as_number(value).filter(|_| r > 0) {
                Some(n) => sheet.write_number(r, out_c, n)?,
                None => sheet.write_string(r, out_c, value)?,
            };
        }
    }
    Ok(())
}

/// Convert one CSV into `<stem>.xlsx` beside it, one sheet per view.
#[instrument(level = "info", skip(path, layout), fields(path = %path.display()))]
pub fn split_csv(path: &Path, layout: &SplitLayout) -> Result<PathBuf> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (records, encoding) = decode::with_fallback(path, &bytes, parse_records)?;
    let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
    debug!(
        encoding = encoding.name(),
        rows = records.len(),
        width,
        "parsed csv"
    );

    let mut workbook = Workbook::new();
    for view in &layout.views {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&view.name)?;
        write_view(sheet, &records, &view.indices(width))?;
    }

    let out = path.with_extension("xlsx");
    workbook
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(out)
}

/// Split every `*.csv` directly inside `dir`. A file that fails is logged
/// and skipped; the rest still run.
pub fn split_folder<W: Write>(dir: &Path, layout: &SplitLayout, out: &mut W) -> Result<SplitSummary> {
    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob(&pattern)?.filter_map(|e| e.ok()).collect();
    files.sort();
    info!("{} csv files in {}", files.len(), dir.display());

    let mut summary = SplitSummary::default();
    for path in files {
        match split_csv(&path, layout) {
            Ok(saved) => {
                writeln!(
                    out,
                    "Processed and saved {} as {}",
                    file_name(&path),
                    file_name(&saved)
                )?;
                summary.converted.push(saved);
            }
            Err(e) => {
                error!("split {} failed: {:#}", path.display(), e);
                summary.failed.push((path, format!("{:#}", e)));
            }
        }
    }
    Ok(summary)
}
