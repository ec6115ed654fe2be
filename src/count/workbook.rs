use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::info;

use super::{check_columns, extension, is_blank, CountPlan, RowRule, SheetCount, SheetScope};
use crate::error::ReadError;

/// Count every sheet (or only the first) of an XLS/XLSX/XLSB workbook.
pub fn count_workbook(path: &Path, plan: &CountPlan) -> Result<Vec<SheetCount>, ReadError> {
    let rule = plan.rule(extension(path).as_deref().unwrap_or_default());
    let mut workbook = open_workbook_auto(path)?;

    let mut names = workbook.sheet_names();
    if plan.sheets == SheetScope::First {
        names.truncate(1);
    }

    let mut counts = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = count_range(&range, plan, rule)?;
        info!(sheet = %name, rows, "counted");
        counts.push(SheetCount { name, rows });
    }
    Ok(counts)
}

/// Count rows of one sheet. Column indices are absolute (0 is column `A`),
/// independent of where the used range starts.
pub fn count_range(range: &Range<Data>, plan: &CountPlan, rule: RowRule) -> Result<u64, ReadError> {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        // nothing in the sheet at all
        return Ok(0);
    };
    check_columns(&plan.columns, end.1 as usize + 1)?;

    let first_row = start.0 + u32::from(plan.header);
    let rows = match rule {
        // row numbers are absolute, so leading blank rows count too
        RowRule::Extent => u64::from(end.0) + 1,
        RowRule::Records => (u64::from(end.0) + 1).saturating_sub(u64::from(first_row)),
        RowRule::NonEmpty => (first_row..=end.0)
            .filter(|&r| {
                plan.columns
                    .iter()
                    .any(|&c| !is_blank_cell(range.get_value((r, c as u32))))
            })
            .count() as u64,
    };
    Ok(rows)
}

fn is_blank_cell(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => is_blank(s),
        Some(_) => false,
    }
}
