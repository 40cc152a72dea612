//! # Index Streams
//!
//! Text encoding of a symbol table:
//!
//! ```text
//! length: <N>
//! <key with id 0>
//! <key with id 1>
//! ...
//! ```
//!
//! The position of a key is its id, so a decoded index is the inverse map of
//! the table that wrote it.

use crate::TencError;
use crate::primitives::INDEX_HEADER_PREFIX;
use std::io::{BufRead, Write};

/// Write an index stream for keys given in id order.
///
/// Returns the number of keys written. Keys containing a line break or a
/// carriage return cannot be represented and are rejected with
/// `TencError::InvalidInput`.
pub fn write_index<'a, W, I>(out: &mut W, keys: I) -> Result<u64, TencError>
where
    W: Write,
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: ExactSizeIterator,
{
    let keys = keys.into_iter();
    writeln!(out, "{}{}", INDEX_HEADER_PREFIX, keys.len())?;
    let mut written = 0u64;
    for key in keys {
        if key.contains(['\n', '\r']) {
            return Err(TencError::InvalidInput(format!(
                "index key {} contains a line break",
                written
            )));
        }
        out.write_all(key.as_bytes())?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

/// Read an index stream back into an id-ordered key vector.
///
/// `stream` names the source for error messages. Fails with
/// `TencError::Format` if the header is malformed or the stream ends before
/// the declared number of keys was read. Trailing content after the last
/// declared key is ignored.
pub fn read_index<R: BufRead>(input: &mut R, stream: &str) -> Result<Vec<String>, TencError> {
    let mut line = String::new();
    let n = read_line(input, &mut line, stream, 1)?;
    if n == 0 {
        return Err(TencError::format_at(stream, 1, "missing index header"));
    }

    let declared = line
        .trim_end_matches(['\n', '\r'])
        .strip_prefix(INDEX_HEADER_PREFIX)
        .and_then(|count| count.trim().parse::<u64>().ok())
        .ok_or_else(|| TencError::format_at(stream, 1, format!("malformed header {:?}", line)))?;

    // Cap the pre-allocation; the declared count comes from untrusted bytes.
    let mut keys = Vec::with_capacity(declared.min(1 << 20) as usize);
    for i in 0..declared {
        let line_no = i + 2;
        line.clear();
        if read_line(input, &mut line, stream, line_no)? == 0 {
            return Err(TencError::format_at(
                stream,
                line_no,
                format!("stream ended after {} of {} keys", i, declared),
            ));
        }
        keys.push(strip_terminator(&line).to_string());
    }
    Ok(keys)
}

/// Strip `\n` and a `\r` right before it.
fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn read_line<R: BufRead>(
    input: &mut R,
    buf: &mut String,
    stream: &str,
    line_no: u64,
) -> Result<usize, TencError> {
    input.read_line(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            TencError::format_at(stream, line_no, "invalid UTF-8")
        } else {
            TencError::Io(e)
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
