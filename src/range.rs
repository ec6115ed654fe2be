use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RangeError;

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").expect("static regex"));

/// Widest sheet any supported format can hold (XLSX, column `XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Turn `"3"` or `"2-4"` (1-based, inclusive) into zero-based column indices.
///
/// There is no check against the real column count: an index past the end
/// of a file shows up later as a read error for that file. Only numbers past
/// [`MAX_COLUMNS`] are rejected here.
pub fn parse_column_range(text: &str) -> Result<Vec<usize>, RangeError> {
    let invalid = || RangeError::Invalid(text.to_string());

    let caps = RANGE_RE.captures(text).ok_or_else(invalid)?;
    let start: usize = caps[1].parse().map_err(|_| invalid())?;
    let end: usize = match caps.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => start,
    };

    // column numbers are 1-based
    if start == 0 || end < start || end > MAX_COLUMNS {
        return Err(invalid());
    }
    Ok((start - 1..end).collect())
}
