use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::debug;

use super::{check_columns, is_blank, CountPlan, RowRule};
use crate::{decode, error::ReadError};

/// Count the non-empty rows of a CSV, trying each fallback encoding until
/// one decodes and parses with every requested column present.
pub fn count_csv(path: &Path, plan: &CountPlan) -> Result<u64, ReadError> {
    let bytes = fs::read(path)?;
    let (rows, encoding) = decode::with_fallback(path, &bytes, |text| count_text(text, plan))?;
    debug!(encoding = encoding.name(), rows, "csv decoded");
    Ok(rows)
}

/// Count rows of already-decoded CSV text.
///
/// The width used for the column check is the widest record seen; short
/// records are treated as having empty trailing fields.
pub fn count_text(text: &str, plan: &CountPlan) -> Result<u64, ReadError> {
    let rule = plan.rule("csv");
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut width = 0;
    let mut rows = 0u64;
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        width = width.max(record.len());
        if plan.header && idx == 0 {
            continue;
        }

        let counted = rule != RowRule::NonEmpty
            || plan
                .columns
                .iter()
                .any(|&c| record.get(c).is_some_and(|v| !is_blank(v)));
        if counted {
            rows += 1;
        }
    }

    check_columns(&plan.columns, width)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use encoding_rs::GBK;
    use tempfile::tempdir;

    #[test]
    fn header_is_skipped_in_quick_plan() {
        let text = "小区,流量\nA,1\nB,2\n,3\n";
        assert_eq!(count_text(text, &CountPlan::quick()).unwrap(), 3);
        // same text with no header and two columns: every data line has something
        assert_eq!(
            count_text(text, &CountPlan::column_range(vec![0, 1])).unwrap(),
            4
        );
    }

    #[test]
    fn quick_plan_keeps_rows_with_blank_first_cell() {
        let text = "name,val\n,x\n1,y\n";
        assert_eq!(count_text(text, &CountPlan::quick()).unwrap(), 2);
        assert_eq!(count_text(text, &CountPlan::column_range(vec![0])).unwrap(), 2);
        let mut no_header = CountPlan::column_range(vec![0]);
        no_header.header = true;
        assert_eq!(count_text(text, &no_header).unwrap(), 1);
    }

    #[test]
    fn blank_lines_and_whitespace_do_not_count() {
        let text = "a,b\n\n  ,\t\nc,d\n";
        assert_eq!(
            count_text(text, &CountPlan::column_range(vec![0, 1])).unwrap(),
            2
        );
    }

    #[test]
    fn ragged_rows_use_widest_record() {
        let text = "a\nb,c,d\n";
        assert_eq!(count_text(text, &CountPlan::column_range(vec![2])).unwrap(), 1);
        assert!(matches!(
            count_text(text, &CountPlan::column_range(vec![3])),
            Err(ReadError::ColumnOutOfRange { column: 4, width: 3 })
        ));
    }

    #[test]
    fn empty_file_has_no_columns() {
        assert!(count_text("", &CountPlan::quick()).is_err());
    }

    #[test]
    fn gbk_file_counts() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gbk.csv");
        let (bytes, _, _) = GBK.encode("小区,流量\n东门,1\n西门,2\n");
        fs::write(&path, &bytes)?;

        assert_eq!(count_csv(&path, &CountPlan::quick())?, 2);
        Ok(())
    }
}
