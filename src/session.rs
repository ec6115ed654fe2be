// src/session.rs
use anyhow::{Context, Result};
use rand::Rng;
use std::{
    fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use crate::{
    count::{count_file, CountPlan, StatsRecord},
    range::parse_column_range,
    report::{append_to_existing, MergeOutcome, ReportTable},
    select::FileSelector,
};

/// Report written by the column-range, per-sheet counter.
pub const SHEET_REPORT_FILE: &str = "工作表行数统计结果.xlsx";
/// Report written by the quick first-column counter.
pub const QUICK_REPORT_FILE: &str = "行数统计结果.xlsx";

pub const RANGE_PROMPT: &str = "请输入要统计的列（如 1 或 1-3）：";

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The column range was not understood; nothing was read or written.
    InvalidRange(String),
    /// The selector returned no files; nothing was written.
    NoFiles,
    /// The report at `path` was written. `merge` is `None` for a fresh report.
    Saved {
        path: PathBuf,
        stats: Vec<StatsRecord>,
        merge: Option<MergeOutcome>,
    },
}

/// Print `prompt` and read one line of answer.
pub fn prompt_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading answer")?;
    Ok(line.trim().to_string())
}

/// One interactive counting run: select, count, report.
///
/// Progress lines go to `out`; the report lands in `report_dir`.
pub struct Session<W, G> {
    pub report_dir: PathBuf,
    pub out: W,
    pub rng: G,
}

impl<W: Write, G: Rng> Session<W, G> {
    pub fn new(report_dir: impl Into<PathBuf>, out: W, rng: G) -> Self {
        Self {
            report_dir: report_dir.into(),
            out,
            rng,
        }
    }

    /// Count the columns in `range_text` on every sheet of every selected file.
    pub fn run_column_range(
        &mut self,
        range_text: &str,
        selector: &mut dyn FileSelector,
    ) -> Result<Outcome> {
        let columns = match parse_column_range(range_text) {
            Ok(c) => c,
            Err(e) => {
                writeln!(self.out, "输入无效：{}", e)?;
                return Ok(Outcome::InvalidRange(range_text.to_string()));
            }
        };
        info!(?columns, "column range");
        self.run(CountPlan::column_range(columns), true, SHEET_REPORT_FILE, selector)
    }

    /// Count the first column of the first sheet of every selected file.
    pub fn run_quick(&mut self, selector: &mut dyn FileSelector) -> Result<Outcome> {
        self.run(CountPlan::quick(), false, QUICK_REPORT_FILE, selector)
    }

    #[instrument(level = "info", skip(self, plan, selector))]
    fn run(
        &mut self,
        plan: CountPlan,
        with_sheet: bool,
        report_name: &str,
        selector: &mut dyn FileSelector,
    ) -> Result<Outcome> {
        // ─── 1) pick files ───────────────────────────────────────────────
        let files = selector.select_files(plan.extensions)?;
        if files.is_empty() {
            writeln!(self.out, "未选择任何文件")?;
            return Ok(Outcome::NoFiles);
        }
        info!("{} files selected", files.len());

        // ─── 2) count each file; failures come back as marker records ───
        let mut stats: Vec<StatsRecord> = Vec::new();
        for path in &files {
            let records = count_file(path, &plan);
            for r in &records {
                match &r.sheet_name {
                    Some(sheet) => writeln!(
                        self.out,
                        "文件: {}, 工作表: {}, 行数: {}",
                        r.file_name, sheet, r.row_count
                    )?,
                    None => writeln!(self.out, "文件: {}, 行数: {}", r.file_name, r.row_count)?,
                }
            }
            stats.extend(records);
        }

        // ─── 3) write or merge the report ───────────────────────────────
        let table = ReportTable::from_stats(&stats, with_sheet);
        fs::create_dir_all(&self.report_dir)
            .with_context(|| format!("creating {}", self.report_dir.display()))?;
        let path = report_path(&self.report_dir, report_name);

        let merge = if path.exists() {
            let m = append_to_existing(&path, table, &mut self.rng)?;
            writeln!(self.out, "结果已追加保存到：{}", path.display())?;
            Some(m)
        } else {
            table.save(&path)?;
            writeln!(self.out, "结果已保存到: {}", path.display())?;
            None
        };

        Ok(Outcome::Saved { path, stats, merge })
    }
}

/// Path of a report inside `report_dir`.
pub fn report_path(report_dir: &Path, report_name: &str) -> PathBuf {
    report_dir.join(report_name)
}
