//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Each `cmd_*` function prints its result; the library-style helpers
//! (`convert_files`, `serialize_archive`) return it for programmatic use.

use crate::config::{DEFAULT_CONFIG, TencConfig};
use crate::encoders::{all_encoders, encoder_for};
use crate::sources::InputFormat;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tenc_core::archive::join_name;
use tenc_core::{
    ArchiveWriter, ConversionSession, ExportSession, MinCounts, SessionStats, TencError,
    archive_digest,
};

/// Source name used in errors for standard input.
const STDIN_SOURCE: &str = "<stdin>";

/// Validate an input file path.
///
/// Canonicalizes the path and ensures it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, TencError> {
    let canonical = path.canonicalize().map_err(|e| {
        TencError::InvalidInput(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(TencError::InvalidInput(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output directory path.
fn validate_output_dir(path: &Path) -> Result<PathBuf, TencError> {
    let canonical = path.canonicalize().map_err(|e| {
        TencError::InvalidInput(format!(
            "Invalid output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(TencError::InvalidInput(format!(
            "Output directory '{}' is not a valid directory",
            path.display()
        )));
    }

    Ok(canonical)
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Resolved options of a conversion (command line over config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Reader name.
    pub input_format: String,
    /// Base name of the archive.
    pub name: String,
    /// Optional file name prefix.
    pub prefix: Option<String>,
    /// Directory the archive is written to.
    pub output_dir: PathBuf,
}

/// Convert `files` (or standard input when empty) into a sealed archive.
///
/// Returns the archive path and the session statistics.
pub fn convert_files(
    config: &TencConfig,
    options: &ConvertOptions,
    files: &[PathBuf],
) -> Result<(PathBuf, SessionStats), TencError> {
    let format = InputFormat::from_name(&options.input_format)?;
    let output_dir = validate_output_dir(&options.output_dir)?;
    let writer = ArchiveWriter::create(&output_dir, &options.name, options.prefix.as_deref())?;
    let classifier = config.classifier();
    let mut session = ConversionSession::new_in(&output_dir)?;

    if files.is_empty() {
        tracing::info!("Reading {} input from standard input", format.name());
        let stdin = std::io::stdin();
        session.ingest(format.events(stdin.lock(), STDIN_SOURCE, &classifier))?;
    }
    for file in files {
        let path = validate_file_path(file)?;
        tracing::info!("Reading {} ({})", path.display(), format.name());
        let input = BufReader::new(File::open(&path)?);
        let source = path.to_string_lossy();
        let events = session.ingest(format.events(input, &source, &classifier))?;
        tracing::debug!("{}: {} events", source, events);
    }

    let stats = session.stats();
    let archive = session.finish(writer)?;
    Ok((archive, stats))
}

/// Convert input files into an archive.
pub fn cmd_convert(
    config: &TencConfig,
    options: &ConvertOptions,
    files: &[PathBuf],
    json_mode: bool,
) -> Result<(), TencError> {
    let (archive, stats) = convert_files(config, options, files)?;

    if json_mode {
        print_json(&serde_json::json!({
            "archive": archive.to_string_lossy(),
            "stats": stats,
        }));
        return Ok(());
    }

    println!("Archive written: {}", archive.display());
    println!();
    println!("Entities:             {}", stats.entities);
    println!("Predicates:           {}", stats.predicates);
    println!("Relations:            {}", stats.relations);
    println!("Entity Attributes:    {}", stats.entity_attributes);
    println!("Predicate Attributes: {}", stats.predicate_attributes);

    Ok(())
}

// =============================================================================
// SERIALIZE COMMAND
// =============================================================================

/// Files written by one serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeReport {
    /// The generated file.
    pub output: PathBuf,
    /// Records written by the encoder.
    pub records: u64,
    /// Pruned entity and predicate index files.
    pub pruned_indexes: Vec<PathBuf>,
}

/// Prune `archive` and write it with the named encoder into `output_dir`.
///
/// The output is `[prefix-]{base}-generated.{ext}`; the pruned entity and
/// predicate indexes are written alongside it.
pub fn serialize_archive(
    archive: &Path,
    format: &str,
    min_counts: MinCounts,
    output_dir: &Path,
) -> Result<SerializeReport, TencError> {
    let encoder = encoder_for(format)?;
    let archive = validate_file_path(archive)?;
    let output_dir = validate_output_dir(output_dir)?;
    let session = ExportSession::open(&archive, min_counts)?;

    let reader = session.archive();
    let stem = format!("{}-generated", reader.base_name());
    let output = output_dir.join(join_name(&stem, encoder.extension(), reader.prefix()));

    tracing::info!(
        "Serializing {} as {} to {}",
        archive.display(),
        encoder.name(),
        output.display()
    );
    let mut out = BufWriter::new(File::create(&output)?);
    let records = encoder.encode(&session, &mut out)?;
    out.flush()?;

    let pruned_indexes = session.write_pruned_indexes(&output_dir)?;
    Ok(SerializeReport {
        output,
        records,
        pruned_indexes,
    })
}

/// Prune an archive and write it in an output format.
pub fn cmd_serialize(
    archive: &Path,
    format: &str,
    min_counts: MinCounts,
    output_dir: &Path,
    json_mode: bool,
) -> Result<(), TencError> {
    let report = serialize_archive(archive, format, min_counts, output_dir)?;

    if json_mode {
        print_json(&serde_json::json!({
            "output": report.output.to_string_lossy(),
            "records": report.records,
            "pruned_indexes": report
                .pruned_indexes
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("Wrote {} records to {}", report.records, report.output.display());
    for path in &report.pruned_indexes {
        println!("Pruned index: {}", path.display());
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show the shape of an archive, before and after pruning.
pub fn cmd_status(archive: &Path, config: &TencConfig, json_mode: bool) -> Result<(), TencError> {
    let archive = validate_file_path(archive)?;
    let min_counts = config.prune.min_counts(None, None);
    let session = ExportSession::open(&archive, min_counts)?;
    let shape = session.shape();
    let pruned = session.pruned_shape()?;

    if json_mode {
        print_json(&serde_json::json!({
            "archive": archive.to_string_lossy(),
            "streams": session.archive().stream_names().collect::<Vec<_>>(),
            "min_counts": {
                "entities": min_counts.entities,
                "predicates": min_counts.predicates
            },
            "raw": {
                "entities": shape.entity_count(),
                "predicates": shape.predicate_count(),
                "relations": shape.relation_count(),
                "entity_attribute_nnz": shape.entity_attribute_nnz,
                "predicate_attribute_nnz": shape.predicate_attribute_nnz
            },
            "pruned": {
                "entities": pruned.entity_count(),
                "predicates": pruned.predicate_count(),
                "relations": pruned.relation_count(),
                "entity_attribute_nnz": pruned.entity_attribute_nnz,
                "predicate_attribute_nnz": pruned.predicate_attribute_nnz
            }
        }));
        return Ok(());
    }

    println!("tenc Archive Status");
    println!("===================");
    println!("Archive: {}", archive.display());
    println!(
        "Min counts: entities > {}, predicates > {}",
        min_counts.entities, min_counts.predicates
    );
    println!();
    println!("                      raw        pruned");
    println!(
        "Entities:     {:>12}  {:>12}",
        shape.entity_count(),
        pruned.entity_count()
    );
    println!(
        "Predicates:   {:>12}  {:>12}",
        shape.predicate_count(),
        pruned.predicate_count()
    );
    println!(
        "Relations:    {:>12}  {:>12}",
        shape.relation_count(),
        pruned.relation_count()
    );
    println!(
        "Ent. attrs:   {:>12}  {:>12}",
        shape.entity_attribute_nnz, pruned.entity_attribute_nnz
    );
    println!(
        "Pred. attrs:  {:>12}  {:>12}",
        shape.predicate_attribute_nnz, pruned.predicate_attribute_nnz
    );

    Ok(())
}

// =============================================================================
// INDEX COMMAND
// =============================================================================

/// Read one index table. Entity and predicate indexes are pruned.
pub fn read_index_table(session: &ExportSession, kind: &str) -> Result<Vec<String>, TencError> {
    match kind {
        "entities" => session.entity_index(),
        "predicates" => session.predicate_index(),
        "entity-attributes" => session.entity_attribute_index(),
        "predicate-attributes" => session.predicate_attribute_index(),
        _ => Err(TencError::InvalidInput(format!(
            "Unknown index kind ({}); expected entities, predicates, \
             entity-attributes or predicate-attributes",
            kind
        ))),
    }
}

/// Print an index table of an archive.
pub fn cmd_index(
    archive: &Path,
    kind: &str,
    config: &TencConfig,
    json_mode: bool,
) -> Result<(), TencError> {
    let archive = validate_file_path(archive)?;
    let session = ExportSession::open(&archive, config.prune.min_counts(None, None))?;
    let keys = read_index_table(&session, kind)?;

    if json_mode {
        print_json(&serde_json::json!({
            "kind": kind,
            "keys": keys,
        }));
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (id, key) in keys.iter().enumerate() {
        writeln!(out, "{}\t{}", id, key)?;
    }
    out.flush()?;

    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List available readers and encoders.
pub fn cmd_list(json_mode: bool) -> Result<(), TencError> {
    let encoders = all_encoders();

    if json_mode {
        print_json(&serde_json::json!({
            "readers": InputFormat::ALL
                .iter()
                .map(|f| serde_json::json!({ "name": f.name(), "description": f.description() }))
                .collect::<Vec<_>>(),
            "encoders": encoders
                .iter()
                .map(|e| serde_json::json!({ "name": e.name(), "extension": e.extension() }))
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("Readers:");
    for format in InputFormat::ALL {
        println!("  {:<14} {}", format.name(), format.description());
    }
    println!();
    println!("Encoders:");
    for encoder in &encoders {
        println!("  {:<14} .{}", encoder.name(), encoder.extension());
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the default configuration file.
pub fn cmd_init(config_path: &Path, force: bool) -> Result<(), TencError> {
    if config_path.exists() && !force {
        return Err(TencError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    println!("Initialized configuration at {}", config_path.display());

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute BLAKE3 digest of an archive.
pub fn cmd_hash(archive: &Path, json_mode: bool) -> Result<(), TencError> {
    let archive = validate_file_path(archive)?;
    let digest = archive_digest(&archive)?;

    if json_mode {
        print_json(&serde_json::json!({
            "archive": archive.to_string_lossy(),
            "algorithm": "blake3",
            "hash": digest,
        }));
        return Ok(());
    }

    println!("BLAKE3 Hash: {}", digest);
    println!("Archive:     {}", archive.display());

    Ok(())
}
