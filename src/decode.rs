use encoding_rs::{Encoding, GBK, UTF_8};
use std::{borrow::Cow, path::Path};
use tracing::debug;

use crate::error::ReadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encodings tried, in order, for every CSV the tools read.
pub fn fallback_encodings() -> [&'static Encoding; 2] {
    [UTF_8, GBK]
}

/// Decode `bytes` only if every sequence is valid in `encoding`.
pub fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Decode with each fallback encoding in turn and hand the text to `accept`.
///
/// The first encoding that both decodes cleanly and is accepted wins. When
/// none do, the last rejection from `accept` is returned, or an encoding
/// error if no encoding could decode the bytes at all.
pub fn with_fallback<T>(
    path: &Path,
    bytes: &[u8],
    mut accept: impl FnMut(&str) -> Result<T, ReadError>,
) -> Result<(T, &'static Encoding), ReadError> {
    let mut last_rejection = None;

    for encoding in fallback_encodings() {
        let Some(text) = decode_strict(bytes, encoding) else {
            debug!(path = %path.display(), encoding = encoding.name(), "not decodable");
            continue;
        };
        match accept(&text) {
            Ok(value) => return Ok((value, encoding)),
            Err(e) => {
                debug!(path = %path.display(), encoding = encoding.name(), error = %e, "rejected");
                last_rejection = Some(e);
            }
        }
    }

    Err(last_rejection.unwrap_or_else(|| ReadError::Encoding {
        path: path.to_path_buf(),
        tried: fallback_encodings().iter().map(|e| e.name()).collect(),
    }))
}
