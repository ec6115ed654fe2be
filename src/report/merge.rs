use anyhow::Result;
use rand::Rng;
use std::path::Path;
use tracing::{error, info};

use super::{Cell, ReportTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New columns were appended to the existing report.
    Appended,
    /// The existing report could not be read and was overwritten.
    Replaced,
}

/// Append the columns of `new` to the right of `existing`.
///
/// Rows line up by position only: row N of the old report sits next to row
/// N of the new batch. The shorter side is padded with empty cells. A new
/// column whose name is taken becomes `<name>_<n>` with `n` drawn from
/// 1..=1000 until the name is free.
pub fn merge_tables<R: Rng>(
    existing: ReportTable,
    new: ReportTable,
    rng: &mut R,
) -> ReportTable {
    let height = existing.height().max(new.height());
    let mut merged = existing;
    merged.pad_to(height);

    for column in new.into_columns() {
        let mut name = column.name.clone();
        while merged.contains(&name) {
            name = format!("{}_{}", column.name, rng.gen_range(1..=1000));
        }
        if name != column.name {
            info!(from = %column.name, to = %name, "renamed colliding column");
        }

        let mut cells = column.cells;
        cells.resize(height, Cell::Empty);
        merged.push_column(name, cells);
    }
    merged
}

/// Merge `new` into the report at `path` and write it back in place.
///
/// When the existing report cannot be read, `new` alone is written.
pub fn append_to_existing<R: Rng>(
    path: &Path,
    new: ReportTable,
    rng: &mut R,
) -> Result<MergeOutcome> {
    let (table, outcome) = match ReportTable::load(path) {
        Ok(existing) => (merge_tables(existing, new, rng), MergeOutcome::Appended),
        Err(e) => {
            error!("读取或合并现有文件出错：{:#}", e);
            (new, MergeOutcome::Replaced)
        }
    };
    table.save(path)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    fn numbers(name: &str, values: &[f64]) -> ReportTable {
        let mut t = ReportTable::new();
        t.push_column(name, values.iter().map(|v| Cell::Number(*v)).collect());
        t
    }

    #[test]
    fn colliding_name_gets_random_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let merged = merge_tables(
            numbers("A", &[1.0, 2.0, 3.0]),
            numbers("A", &[4.0, 5.0, 6.0]),
            &mut rng,
        );

        let cols = merged.columns();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "A");
        assert_eq!(cols[0].cells.len(), 3);
        assert_eq!(cols[1].cells.len(), 3);
        assert_eq!(cols[1].cells[0], Cell::Number(4.0));

        let suffix: u32 = cols[1]
            .name
            .strip_prefix("A_")
            .expect("renamed column keeps its base name")
            .parse()
            .unwrap();
        assert!((1..=1000).contains(&suffix));
    }

    #[test]
    fn shorter_side_is_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let merged = merge_tables(
            numbers("old", &[1.0, 2.0]),
            numbers("new", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            &mut rng,
        );
        assert_eq!(merged.height(), 5);
        let old = &merged.column("old").unwrap().cells;
        assert_eq!(old.len(), 5);
        assert!(old[2..].iter().all(|c| *c == Cell::Empty));

        let merged = merge_tables(
            numbers("old", &[1.0, 2.0, 3.0]),
            numbers("new", &[9.0]),
            &mut rng,
        );
        assert_eq!(
            merged.column("new").unwrap().cells,
            vec![Cell::Number(9.0), Cell::Empty, Cell::Empty]
        );
    }

    #[test]
    fn repeated_runs_keep_names_unique() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut report = numbers("行数", &[1.0]);
        for _ in 0..20 {
            report = merge_tables(report, numbers("行数", &[2.0]), &mut rng);
        }
        let mut names: Vec<_> = report.columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names.len(), 21);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 21);
    }

    #[test]
    fn append_writes_merged_report() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("report.xlsx");
        numbers("A", &[1.0, 2.0]).save(&path)?;

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = append_to_existing(&path, numbers("B", &[3.0]), &mut rng)?;
        assert_eq!(outcome, MergeOutcome::Appended);

        let loaded = ReportTable::load(&path)?;
        assert_eq!(loaded.columns().len(), 2);
        assert_eq!(
            loaded.column("B").unwrap().cells,
            vec![Cell::Number(3.0), Cell::Empty]
        );
        Ok(())
    }

    #[test]
    fn unreadable_report_is_replaced() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("report.xlsx");
        std::fs::write(&path, "not a workbook")?;

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = append_to_existing(&path, numbers("B", &[3.0]), &mut rng)?;
        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(ReportTable::load(&path)?, numbers("B", &[3.0]));
        Ok(())
    }
}
