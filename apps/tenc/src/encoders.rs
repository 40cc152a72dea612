//! # Output Encoders
//!
//! Restate a pruned archive as text triples. Entities and predicates are
//! written by key, using the pruned index tables; entity attributes with key
//! `"{predicate},{value}"` are written back as literal-valued triples.

use std::io::Write;
use tenc_core::{Encoder, ExportSession, TencError};

/// All available encoders.
#[must_use]
pub fn all_encoders() -> Vec<Box<dyn Encoder>> {
    vec![
        Box::new(NTriplesEncoder),
        Box::new(TurtleEncoder),
        Box::new(MarkovLogicEncoder),
    ]
}

/// Look up an encoder by name.
pub fn encoder_for(name: &str) -> Result<Box<dyn Encoder>, TencError> {
    all_encoders()
        .into_iter()
        .find(|e| e.name() == name)
        .ok_or_else(|| TencError::InvalidInput(format!("Unknown output format ({})", name)))
}

/// Key tables needed to restate records.
struct Names {
    entities: Vec<String>,
    predicates: Vec<String>,
    attributes: Vec<String>,
}

impl Names {
    fn load(session: &ExportSession) -> Result<Self, TencError> {
        Ok(Self {
            entities: session.entity_index()?,
            predicates: session.predicate_index()?,
            attributes: session.entity_attribute_index()?,
        })
    }

    fn entity(&self, id: u64) -> Result<&str, TencError> {
        lookup(&self.entities, id)
    }

    fn predicate(&self, id: u64) -> Result<&str, TencError> {
        lookup(&self.predicates, id)
    }

    /// Split an attribute key into `(predicate, value)`.
    fn attribute(&self, id: u64) -> Result<(&str, &str), TencError> {
        let key = lookup(&self.attributes, id)?;
        Ok(key.split_once(',').unwrap_or((key, "")))
    }
}

fn lookup(keys: &[String], id: u64) -> Result<&str, TencError> {
    usize::try_from(id)
        .ok()
        .and_then(|i| keys.get(i))
        .map(String::as_str)
        .ok_or(TencError::Index {
            id,
            size: keys.len() as u64,
        })
}

/// Walk relations and entity attributes, writing each through its callback.
fn restate(
    session: &ExportSession,
    out: &mut dyn Write,
    mut relation: impl FnMut(&mut dyn Write, &str, &str, &str, bool) -> std::io::Result<()>,
    mut attribute: impl FnMut(&mut dyn Write, &str, &str, &str) -> std::io::Result<()>,
) -> Result<u64, TencError> {
    let names = Names::load(session)?;
    let mut written = 0u64;

    for record in session.relations()? {
        let record = record?;
        relation(
            out,
            names.entity(record.subject)?,
            names.predicate(record.predicate)?,
            names.entity(record.object)?,
            record.weight < 0.0,
        )?;
        written += 1;
    }
    for record in session.entity_attributes()? {
        let record = record?;
        let (predicate, value) = names.attribute(record.attribute)?;
        attribute(out, names.entity(record.item)?, predicate, value)?;
        written += 1;
    }
    Ok(written)
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// =============================================================================
// ENCODERS
// =============================================================================

/// N-Triples with `file://localhost/{name}/` IRIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NTriplesEncoder;

impl Encoder for NTriplesEncoder {
    fn name(&self) -> &'static str {
        "ntriples"
    }

    fn extension(&self) -> &'static str {
        "nt"
    }

    fn encode(&self, session: &ExportSession, out: &mut dyn Write) -> Result<u64, TencError> {
        let base = format!("file://localhost/{}", session.archive().base_name());
        restate(
            session,
            out,
            |out, s, p, o, _| writeln!(out, "<{base}/{s}> <{base}/{p}> <{base}/{o}> ."),
            |out, e, p, v| writeln!(out, "<{base}/{e}> <{base}/{p}> \"{}\" .", escape_literal(v)),
        )
    }
}

/// Turtle with a single `l:` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleEncoder;

impl Encoder for TurtleEncoder {
    fn name(&self) -> &'static str {
        "turtle"
    }

    fn extension(&self) -> &'static str {
        "ttl"
    }

    fn encode(&self, session: &ExportSession, out: &mut dyn Write) -> Result<u64, TencError> {
        writeln!(
            out,
            "@prefix l: <file://localhost/{}/> .",
            session.archive().base_name()
        )?;
        restate(
            session,
            out,
            |out, s, p, o, _| writeln!(out, "l:{s} l:{p} l:{o} ."),
            |out, e, p, v| writeln!(out, "l:{e} l:{p} \"{}\" .", escape_literal(v)),
        )
    }
}

/// Markov-Logic ground atoms; negative weights become negated atoms.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkovLogicEncoder;

impl Encoder for MarkovLogicEncoder {
    fn name(&self) -> &'static str {
        "mln"
    }

    fn extension(&self) -> &'static str {
        "db"
    }

    fn encode(&self, session: &ExportSession, out: &mut dyn Write) -> Result<u64, TencError> {
        restate(
            session,
            out,
            |out, s, p, o, negated| {
                let modifier = if negated { "!" } else { "" };
                writeln!(out, "{modifier}{p}({s},{o})")
            },
            |out, e, p, v| writeln!(out, "{p}({e},{v})"),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
