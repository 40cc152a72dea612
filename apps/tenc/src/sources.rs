//! # Input Readers
//!
//! Line-oriented readers that turn raw input into canonical triples.
//!
//! - `tab-delimited`: `subject \t predicate \t object [\t weight]`
//! - `reverb`: ReVerb extractions (arguments from column 4, confidence in column 8)
//! - `ypss-surface`: semi-synthetic Patty surface data (weight in column 6)
//! - `ypss-facts`: semi-synthetic Patty facts (arguments from column 3, weight in column 6)
//! - `mln`: Markov-Logic ground atoms `[!]pred(subj, obj)`; `!` gives weight -1
//!
//! Blank lines are skipped. A malformed line ends the read with a format
//! error naming the source and line.

use crate::config::AttributeClassifier;
use std::io::BufRead;
use tenc_core::{Event, TencError, Triple};

/// Weight of a triple that carries none.
const DEFAULT_WEIGHT: f64 = 1.0;

/// Weight of a negated Markov-Logic atom.
const NEGATED_WEIGHT: f64 = -1.0;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    TabDelimited,
    ReVerb,
    YpssSurface,
    YpssFacts,
    MarkovLogic,
}

impl InputFormat {
    pub const ALL: [InputFormat; 5] = [
        InputFormat::TabDelimited,
        InputFormat::ReVerb,
        InputFormat::YpssSurface,
        InputFormat::YpssFacts,
        InputFormat::MarkovLogic,
    ];

    /// Look up a reader by name.
    pub fn from_name(name: &str) -> Result<Self, TencError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| TencError::InvalidInput(format!("Unknown input format ({})", name)))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TabDelimited => "tab-delimited",
            Self::ReVerb => "reverb",
            Self::YpssSurface => "ypss-surface",
            Self::YpssFacts => "ypss-facts",
            Self::MarkovLogic => "mln",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TabDelimited => "subject, predicate, object and optional weight, tab-separated",
            Self::ReVerb => "ReVerb extractions with confidence as weight",
            Self::YpssSurface => "semi-synthetic Patty surface triples, weight in column 6",
            Self::YpssFacts => "semi-synthetic Patty facts, arguments from column 3",
            Self::MarkovLogic => "Markov-Logic ground atoms, '!' marks negated atoms",
        }
    }

    /// Parse one line. Returns `Ok(None)` for blank lines.
    pub fn parse_line(
        self,
        line: &str,
        source: &str,
        line_no: u64,
    ) -> Result<Option<Triple>, TencError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let triple = match self {
            Self::TabDelimited => parse_columns(line, 0, Some(3), source, line_no)?,
            Self::ReVerb => parse_columns(line, 4, Some(8), source, line_no)?,
            Self::YpssSurface => parse_columns(line, 0, Some(6), source, line_no)?,
            Self::YpssFacts => parse_columns(line, 3, Some(6), source, line_no)?,
            Self::MarkovLogic => parse_atom(line, source, line_no)?,
        };
        Ok(Some(triple))
    }

    /// Lazily read events from `input`, classifying attribute predicates.
    pub fn events<'a, R: BufRead + 'a>(
        self,
        input: R,
        source: &str,
        classifier: &'a AttributeClassifier,
    ) -> EventReader<'a, R> {
        EventReader {
            format: self,
            input,
            source: source.to_string(),
            classifier,
            line: String::new(),
            line_no: 0,
            done: false,
        }
    }
}

/// Iterator of events read from one input.
#[derive(Debug)]
pub struct EventReader<'a, R> {
    format: InputFormat,
    input: R,
    source: String,
    classifier: &'a AttributeClassifier,
    line: String,
    line_no: u64,
    done: bool,
}

impl<R: BufRead> Iterator for EventReader<'_, R> {
    type Item = Result<Event, TencError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line.clear();
            match self.input.read_line(&mut self.line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_no += 1;
                    match self.format.parse_line(&self.line, &self.source, self.line_no) {
                        Ok(Some(triple)) => return Some(Ok(self.classifier.classify(triple))),
                        Ok(None) => {}
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(TencError::format_at(&self.source, self.line_no + 1, e)));
                }
            }
        }
        None
    }
}

fn parse_columns(
    line: &str,
    offset: usize,
    weight_column: Option<usize>,
    source: &str,
    line_no: u64,
) -> Result<Triple, TencError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let column = |i: usize| {
        fields
            .get(offset + i)
            .map(|f| f.trim())
            .ok_or_else(|| {
                TencError::format_at(
                    source,
                    line_no,
                    format!("expected at least {} tab-separated fields", offset + 3),
                )
            })
    };
    let subject = column(0)?;
    let predicate = column(1)?;
    let object = column(2)?;

    let weight = match weight_column.and_then(|i| fields.get(i)) {
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
            TencError::format_at(source, line_no, format!("invalid weight {:?}", raw))
        })?,
        None => DEFAULT_WEIGHT,
    };
    Ok(Triple::new(subject, predicate, object, weight))
}

/// Parse `[!]pred(subj, obj)`.
fn parse_atom(line: &str, source: &str, line_no: u64) -> Result<Triple, TencError> {
    let malformed = || TencError::format_at(source, line_no, format!("malformed atom {:?}", line));

    let (negated, atom) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let (predicate, rest) = atom.split_once('(').ok_or_else(malformed)?;
    let args = rest.trim_end().strip_suffix(')').ok_or_else(malformed)?;
    let (subject, object) = args.split_once(',').ok_or_else(malformed)?;

    let (predicate, subject, object) = (predicate.trim(), subject.trim(), object.trim());
    if ![predicate, subject, object].iter().all(|s| is_word(s)) {
        return Err(malformed());
    }

    let weight = if negated { NEGATED_WEIGHT } else { DEFAULT_WEIGHT };
    Ok(Triple::new(subject, predicate, object, weight))
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

// =============================================================================
// TESTS
// =============================================================================
