//! # Configuration
//!
//! Optional `tenc.toml` with defaults for conversion and pruning. Every value
//! can be overridden on the command line.
//!
//! ```toml
//! [convert]
//! input_format = "tab-delimited"
//! name = "tensor"
//! output_dir = "."
//!
//! [prune]
//! min_count_entities = 1
//! min_count_predicates = 1
//!
//! [attributes]
//! entity = ["hasWord"]
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tenc_core::primitives::DEFAULT_MIN_COUNT;
use tenc_core::{AttributeAssertion, AttributeTarget, Event, MinCounts, TencError, Triple};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "tenc.toml";

/// Content written by `tenc init`.
pub const DEFAULT_CONFIG: &str = r#"# tenc configuration

[convert]
# Reader for input files (see `tenc list`)
input_format = "tab-delimited"
# Base name of the archive
name = "tensor"
# Optional prefix prepended to every output file
# prefix = "run1"
output_dir = "."

[prune]
# Ids with an occurrence count at or below these thresholds are pruned
min_count_entities = 1
min_count_predicates = 1

[attributes]
# Predicates whose triples are entity attributes instead of relations
entity = []
"#;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TencConfig {
    /// Conversion defaults.
    pub convert: ConvertConfig,
    /// Pruning thresholds.
    pub prune: PruneConfig,
    /// Attribute predicates.
    pub attributes: AttributeConfig,
}

/// `[convert]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Reader name.
    pub input_format: String,
    /// Base name of the archive.
    pub name: String,
    /// Optional prefix of every output file.
    pub prefix: Option<String>,
    /// Directory for archives and generated files.
    pub output_dir: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_format: "tab-delimited".to_string(),
            name: "tensor".to_string(),
            prefix: None,
            output_dir: PathBuf::from("."),
        }
    }
}

/// `[prune]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PruneConfig {
    /// Entity threshold.
    pub min_count_entities: i64,
    /// Predicate threshold.
    pub min_count_predicates: i64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            min_count_entities: DEFAULT_MIN_COUNT,
            min_count_predicates: DEFAULT_MIN_COUNT,
        }
    }
}

impl PruneConfig {
    /// Thresholds with optional command-line overrides applied.
    #[must_use]
    pub fn min_counts(&self, entities: Option<i64>, predicates: Option<i64>) -> MinCounts {
        MinCounts::new(
            entities.unwrap_or(self.min_count_entities),
            predicates.unwrap_or(self.min_count_predicates),
        )
    }
}

/// `[attributes]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeConfig {
    /// Predicates that denote entity attributes.
    pub entity: Vec<String>,
}

impl TencConfig {
    /// Parse a configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self, TencError> {
        toml::from_str(text).map_err(|e| TencError::Config(e.to_string()))
    }

    /// Load `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, TencError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| TencError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::parse(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Classifier for the configured attribute predicates.
    #[must_use]
    pub fn classifier(&self) -> AttributeClassifier {
        AttributeClassifier::new(self.attributes.entity.iter().cloned())
    }
}

/// Decides whether a triple is a relation or an entity attribute.
///
/// A triple whose predicate is listed becomes an attribute of its subject
/// with key `"{predicate},{object}"`.
#[derive(Debug, Clone, Default)]
pub struct AttributeClassifier {
    entity_predicates: BTreeSet<String>,
}

impl AttributeClassifier {
    pub fn new(predicates: impl IntoIterator<Item = String>) -> Self {
        Self {
            entity_predicates: predicates.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn classify(&self, triple: Triple) -> Event {
        if self.entity_predicates.contains(&triple.predicate) {
            Event::Attribute(AttributeAssertion::new(
                triple.subject,
                AttributeTarget::Entity,
                format!("{},{}", triple.predicate, triple.object),
            ))
        } else {
            Event::Relation(triple)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_to_defaults() {
        let parsed = TencConfig::parse(DEFAULT_CONFIG).expect("parse");
        assert_eq!(parsed, TencConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let parsed = TencConfig::parse("[prune]\nmin_count_entities = 4\n").expect("parse");
        assert_eq!(parsed.prune.min_count_entities, 4);
        assert_eq!(parsed.prune.min_count_predicates, DEFAULT_MIN_COUNT);
        assert_eq!(parsed.convert.name, "tensor");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            TencConfig::parse("[prune]\nmin_count = 4\n"),
            Err(TencError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = TencConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, TencConfig::default());
    }

    #[test]
    fn cli_overrides_thresholds() {
        let prune = PruneConfig::default();
        assert_eq!(prune.min_counts(Some(0), None), MinCounts::new(0, DEFAULT_MIN_COUNT));
    }

    #[test]
    fn classifier_turns_listed_predicates_into_attributes() {
        let classifier = AttributeClassifier::new(["hasWord".to_string()]);
        assert_eq!(
            classifier.classify(Triple::new("e", "hasWord", "cat", 1.0)),
            Event::Attribute(AttributeAssertion::new(
                "e",
                AttributeTarget::Entity,
                "hasWord,cat"
            ))
        );
        assert!(matches!(
            classifier.classify(Triple::new("e", "likes", "f", 1.0)),
            Event::Relation(_)
        ));
    }
}
