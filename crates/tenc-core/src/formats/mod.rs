//! # Stream Formats
//!
//! Text codecs for the streams stored inside an archive.
//!
//! - `index`: symbol tables (`length: N` header + one key per line)
//! - `shape`: tensor size and occurrence statistics
//! - `records`: relation and attribute lines
//!
//! These are pure transformations over `Read`/`Write`; archive I/O lives in
//! the `archive` module.

pub mod index;
pub mod records;
pub mod shape;

pub use index::{read_index, write_index};
pub use records::{parse_attribute, parse_relation, write_attribute, write_relation};
pub use shape::ShapeHeader;
