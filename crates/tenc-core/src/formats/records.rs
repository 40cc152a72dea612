//! # Record Lines
//!
//! Line encodings of relation and attribute records. Whitespace-delimited
//! numbers, one record per line:
//!
//! - relation:  `subject object predicate weight` (weight with fixed decimals)
//! - attribute: `item attribute count`
//!
//! The column order of relations (object before predicate) matches the
//! subscript layout expected by numeric tools.

use crate::primitives::WEIGHT_PRECISION;
use crate::{AttributeRecord, RelationRecord, TencError};
use std::io::Write;

/// Append one relation line.
pub fn write_relation<W: Write>(out: &mut W, record: &RelationRecord) -> Result<(), TencError> {
    writeln!(
        out,
        "{} {} {} {:.*}",
        record.subject, record.object, record.predicate, WEIGHT_PRECISION, record.weight
    )?;
    Ok(())
}

/// Append one attribute line.
pub fn write_attribute<W: Write>(out: &mut W, record: &AttributeRecord) -> Result<(), TencError> {
    writeln!(out, "{} {} {}", record.item, record.attribute, record.count)?;
    Ok(())
}

/// Parse one relation line.
pub fn parse_relation(line: &str, stream: &str, line_no: u64) -> Result<RelationRecord, TencError> {
    let mut fields = line.split_whitespace();
    let (Some(s), Some(o), Some(p), Some(w), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(TencError::format_at(
            stream,
            line_no,
            format!("expected 4 fields in relation {:?}", line.trim_end()),
        ));
    };

    let weight = w
        .parse::<f64>()
        .map_err(|_| TencError::format_at(stream, line_no, format!("invalid weight {:?}", w)))?;

    Ok(RelationRecord::new(
        parse_id(s, stream, line_no)?,
        parse_id(p, stream, line_no)?,
        parse_id(o, stream, line_no)?,
        weight,
    ))
}

/// Parse one attribute line.
pub fn parse_attribute(
    line: &str,
    stream: &str,
    line_no: u64,
) -> Result<AttributeRecord, TencError> {
    let mut fields = line.split_whitespace();
    let (Some(item), Some(attr), Some(count), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(TencError::format_at(
            stream,
            line_no,
            format!("expected 3 fields in attribute {:?}", line.trim_end()),
        ));
    };

    Ok(AttributeRecord::new(
        parse_id(item, stream, line_no)?,
        parse_id(attr, stream, line_no)?,
        parse_id(count, stream, line_no)?,
    ))
}

fn parse_id(field: &str, stream: &str, line_no: u64) -> Result<u64, TencError> {
    field
        .parse::<u64>()
        .map_err(|_| TencError::format_at(stream, line_no, format!("invalid integer {:?}", field)))
}

// =============================================================================
// TESTS
// =============================================================================
