//! String table records
//!
//! # Layout
//! ```text
//! 0x00: length u32          string payload length in bytes
//! 0x04: padding u32
//! 0x08: offset i64          absolute offset of the UTF-8 payload
//! ```
//!
//! Entries are pointer records: the text itself lives elsewhere in the file
//! and is fetched with the usual save-seek-restore discipline.

use std::io::Cursor;

use crate::error::PapaError;
use crate::primitives::{read_at, read_bytes, read_i64, read_u32};

/// Decode one string-table entry, following its payload pointer
pub(crate) fn read_string_entry(cursor: &mut Cursor<&[u8]>) -> Result<String, PapaError> {
    let length = read_u32(cursor)?;
    let _padding = read_u32(cursor)?;
    let offset = read_i64(cursor)?;

    let bytes = read_at(cursor, offset as u64, |c| read_bytes(c, length as usize))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Resolve a name index against the string table
///
/// Named entities tolerate missing names: a negative or out-of-range index
/// yields the empty string. Bone names are the one exception and are
/// validated separately.
pub(crate) fn name_from_index(strings: &[String], index: i64) -> String {
    if index < 0 {
        return String::new();
    }
    strings
        .get(index as usize)
        .cloned()
        .unwrap_or_default()
}
